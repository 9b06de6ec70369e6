use std::fmt;

use crate::lookahead::LookAhead;
use crate::token::{Token, TokenKind};

/// One position of a query pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Kind and text must both be equal
    Exact(Token),
    /// Any token of this kind
    Any(TokenKind),
}

impl Pattern {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Pattern::Exact(expected) => expected == token,
            Pattern::Any(kind) => *kind == token.kind,
        }
    }

    /// Token shown in diagnostics for this position
    pub fn display_token(&self) -> Token {
        match self {
            Pattern::Exact(token) => token.clone(),
            Pattern::Any(kind) => Token::new(*kind, format!("?{kind}")),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(token) => write!(f, "{token}"),
            Pattern::Any(kind) => write!(f, "{kind} *"),
        }
    }
}

/// Test whether the upcoming items match `pattern`, without consuming them
///
/// Returns the concretely matched items in order.
pub fn match_tokens<I>(cursor: &mut LookAhead<I>, pattern: &[Pattern]) -> Option<Vec<I::Item>>
where
    I: Iterator,
    I::Item: AsRef<Token> + Clone,
{
    let mut matched = Vec::with_capacity(pattern.len());
    for (i, expected) in pattern.iter().enumerate() {
        let item = cursor.peek(i)?;
        if !expected.matches(item.as_ref()) {
            return None;
        }
        matched.push(item.clone());
    }
    Some(matched)
}
