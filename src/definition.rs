use std::fmt;

use crate::error::{PreprocessError, Result};
use crate::lookahead::LookAhead;
use crate::matcher::Pattern;
use crate::token::{Token, TokenKind, pretty_format_tokens};

/// Item of a macro replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Emitted as is
    Literal(Token),
    /// Re-emit the token matched at this position of the macro name
    BackRef(usize),
    /// Open a new indentation level
    Indent,
}

/// A macro: a token pattern and what it expands to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: Vec<Pattern>,
    pub replacement: Vec<Replacement>,
}

impl Definition {
    /// Macro name as written, for diagnostics
    pub fn name_text(&self) -> String {
        self.name
            .iter()
            .map(|p| p.display_token().text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: Vec<Token> = self.name.iter().map(Pattern::display_token).collect();
        let replacement: Vec<Token> = self
            .replacement
            .iter()
            .map(|r| match r {
                Replacement::Literal(token) => token.clone(),
                Replacement::BackRef(i) => Token::new(TokenKind::ErrorToken, format!("?{i}")),
                Replacement::Indent => Token::new(TokenKind::Indent, "?INDENT"),
            })
            .collect();
        write!(
            f,
            "{} => {}",
            pretty_format_tokens(&name),
            pretty_format_tokens(&replacement)
        )
    }
}

/// Ordered macro table; the first entry that matches wins
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Definitions(Vec<Definition>);

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition; an existing entry with the same name is kept
    pub fn define(&mut self, definition: Definition) {
        self.0.push(definition);
    }

    /// Append all entries of `other`, keeping their order
    pub fn extend(&mut self, other: Definitions) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Definition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Definitions {
    type Item = &'a Definition;
    type IntoIter = std::slice::Iter<'a, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Flat definition body before it is split into name and replacement
#[derive(Debug, Clone, PartialEq)]
enum BodyItem {
    Token(Token),
    Wildcard(TokenKind),
    BackRef(usize),
    /// A backtick written directly, delimiting a wide name
    Delimiter,
}

const BLANK: &str = " ";
const ESCAPE: &str = "?";
const WIDE: &str = "`";

fn escape(name: &str) -> Option<BodyItem> {
    let item = match name {
        "INDENT" => BodyItem::Wildcard(TokenKind::Indent),
        "NUMBER" => BodyItem::Wildcard(TokenKind::Number),
        "STRING" => BodyItem::Wildcard(TokenKind::String),
        "DEDENT" => BodyItem::Token(Token::new(TokenKind::Dedent, "")),
        "NEWLINE" => BodyItem::Token(Token::new(TokenKind::Newline, "\n")),
        "NL" => BodyItem::Token(Token::new(TokenKind::Nl, "\n")),
        "BACKTICK" => BodyItem::Token(Token::error(WIDE)),
        "?" => BodyItem::Token(Token::error(ESCAPE)),
        "ENDMARKER" => BodyItem::Token(Token::new(TokenKind::EndMarker, "")),
        digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            BodyItem::BackRef(digits.parse().ok()?)
        }
        _ => return None,
    };
    Some(item)
}

fn at_line_end<I>(cursor: &mut LookAhead<I>) -> bool
where
    I: Iterator,
    I::Item: AsRef<Token>,
{
    cursor.peek(0).is_none_or(|item| {
        let kind = item.as_ref().kind;
        kind.is_line_end() || kind == TokenKind::EndMarker
    })
}

/// Parse the body of a `!define` directive
///
/// The cursor must be positioned right after the `! define` sentinel. Reads
/// up to, but not including, the end of the line.
pub fn parse_definition<I>(cursor: &mut LookAhead<I>) -> Result<Definition>
where
    I: Iterator,
    I::Item: AsRef<Token>,
{
    let mut source = vec!["!define".to_string()];
    let mut body = Vec::new();

    while !at_line_end(cursor) {
        let Some(item) = cursor.next() else { break };
        let token = item.as_ref();
        if token.is(TokenKind::ErrorToken, BLANK) {
            continue;
        }
        source.push(token.text.clone());
        if token.is(TokenKind::ErrorToken, ESCAPE) {
            let name = match cursor.next() {
                Some(next) if !next.as_ref().kind.is_line_end() => next.as_ref().text.clone(),
                _ => {
                    return Err(PreprocessError::definition(
                        source.join(" "),
                        "escape `?` at end of line",
                    ));
                }
            };
            source.push(name.clone());
            match escape(&name) {
                Some(escaped) => body.push(escaped),
                None => {
                    // keep consuming so the error names the whole directive
                    while !at_line_end(cursor) {
                        if let Some(rest) = cursor.next() {
                            source.push(rest.as_ref().text.clone());
                        }
                    }
                    return Err(PreprocessError::definition(
                        source.join(" "),
                        format!("unknown escape ?{name}"),
                    ));
                }
            }
        } else if token.is(TokenKind::ErrorToken, WIDE) {
            body.push(BodyItem::Delimiter);
        } else {
            body.push(BodyItem::Token(token.clone()));
        }
    }

    let directive = source.join(" ");
    split_definition(&directive, body)
}

fn split_definition(directive: &str, body: Vec<BodyItem>) -> Result<Definition> {
    let (name, rest) = match body.split_first() {
        None => return Err(PreprocessError::definition(directive, "empty definition")),
        Some((BodyItem::Delimiter, tail)) => {
            let close = tail
                .iter()
                .position(|item| *item == BodyItem::Delimiter)
                .ok_or_else(|| {
                    PreprocessError::definition(directive, "expected ` to close definition")
                })?;
            if close == 0 {
                return Err(PreprocessError::definition(directive, "empty macro name"));
            }
            (&tail[..close], &tail[close + 1..])
        }
        Some((_, tail)) => (&body[..1], tail),
    };

    let name = name
        .iter()
        .map(|item| match item {
            BodyItem::Token(token) => Ok(Pattern::Exact(token.clone())),
            BodyItem::Wildcard(kind) => Ok(Pattern::Any(*kind)),
            BodyItem::Delimiter => Ok(Pattern::Exact(Token::error(WIDE))),
            BodyItem::BackRef(i) => Err(PreprocessError::definition(
                directive,
                format!("back-reference ?{i} in macro name"),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    let replacement = rest
        .iter()
        .map(|item| match item {
            BodyItem::Token(token) => Ok(Replacement::Literal(token.clone())),
            BodyItem::Delimiter => Ok(Replacement::Literal(Token::error(WIDE))),
            BodyItem::Wildcard(TokenKind::Indent) => Ok(Replacement::Indent),
            BodyItem::Wildcard(kind) => Err(PreprocessError::definition(
                directive,
                format!("?{kind} can only be used in a macro name"),
            )),
            BodyItem::BackRef(i) if *i < name.len() => Ok(Replacement::BackRef(*i)),
            BodyItem::BackRef(i) => Err(PreprocessError::definition(
                directive,
                format!(
                    "back-reference ?{i} out of range for a name of {} token(s)",
                    name.len()
                ),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Definition { name, replacement })
}

/// Parse the file reference of an `!include` directive
///
/// The cursor must be positioned right after the `! include` sentinel.
pub fn parse_include_reference<I>(cursor: &mut LookAhead<I>) -> String
where
    I: Iterator,
    I::Item: AsRef<Token>,
{
    let mut reference = String::new();
    while !at_line_end(cursor) {
        let Some(item) = cursor.next() else { break };
        reference.push_str(&item.as_ref().text);
    }
    strip_quotes(&reference).to_string()
}

fn strip_quotes(reference: &str) -> &str {
    let quotes = ['"', '\''];
    let reference = reference.strip_prefix(quotes).unwrap_or(reference);
    reference.strip_suffix(quotes).unwrap_or(reference)
}
