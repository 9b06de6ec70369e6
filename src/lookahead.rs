use std::collections::VecDeque;

/// Iterator adapter with buffered lookahead at arbitrary depth
///
/// Items pulled from the source while peeking are kept in the buffer and
/// handed out by [`Iterator::next`] before the source is touched again.
pub struct LookAhead<I: Iterator> {
    source: I,
    buffer: VecDeque<I::Item>,
}

impl<I: Iterator> LookAhead<I> {
    pub fn new(source: I) -> Self {
        Self {
            source,
            buffer: VecDeque::new(),
        }
    }

    /// Item `n` positions ahead, without consuming anything
    pub fn peek(&mut self, n: usize) -> Option<&I::Item> {
        while self.buffer.len() <= n {
            let item = self.source.next()?;
            self.buffer.push_back(item);
        }
        self.buffer.get(n)
    }

    /// Consume and discard up to `n` items
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.next().is_none() {
                break;
            }
        }
    }

    /// Put `items` ahead of everything not yet consumed, keeping their order
    pub fn push_front<T>(&mut self, items: T)
    where
        T: IntoIterator<Item = I::Item>,
        T::IntoIter: DoubleEndedIterator,
    {
        for item in items.into_iter().rev() {
            self.buffer.push_front(item);
        }
    }
}

impl<I: Iterator> Iterator for LookAhead<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.buffer.pop_front() {
            Some(item) => Some(item),
            None => self.source.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let mut it = LookAhead::new(1..=5);
        assert_eq!(it.peek(2), Some(&3));
        assert_eq!(it.peek(0), Some(&1));
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next(), Some(2));
    }

    #[test]
    fn test_peek_past_end() {
        let mut it = LookAhead::new(1..=2);
        assert_eq!(it.peek(2), None);
        // buffered items survive a failed peek
        assert_eq!(it.collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_advance() {
        let mut it = LookAhead::new(1..=5);
        it.peek(1);
        it.advance(3);
        assert_eq!(it.next(), Some(4));
        it.advance(10);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_push_front() {
        let mut it = LookAhead::new(1..=3);
        it.peek(1);
        it.next();
        it.push_front(vec![10, 11]);
        assert_eq!(it.collect::<Vec<_>>(), vec![10, 11, 2, 3]);
    }
}
