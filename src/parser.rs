use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::trace;

use crate::error::LexError;
use crate::token::{Token, TokenKind};

#[derive(Parser)]
#[grammar = "src/python.pest"]
pub struct PythonParser;

impl PythonParser {
    /// Tokenize Python-style source into `(kind, text)` tokens
    ///
    /// Produces `INDENT`/`DEDENT` tokens from leading whitespace, `NEWLINE`
    /// for the end of a logical line, `NL` for other line breaks, and a
    /// final `ENDMARKER`. Whitespace directly before an unrecognized
    /// character becomes one `ERRORTOKEN` per whitespace character.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let file = PythonParser::parse(Rule::file, source)
            .map_err(Box::new)?
            .next();

        let mut layout = Layout::default();
        if let Some(file) = file {
            for pair in file.into_inner() {
                layout.feed(pair)?;
            }
        }
        let tokens = layout.finish()?;
        trace!(count = tokens.len(), "tokenized source");
        Ok(tokens)
    }
}

/// Turns lexemes into tokens, tracking indentation and logical lines
#[derive(Default)]
struct Layout<'a> {
    tokens: Vec<Token>,
    /// Full indentation of each open block
    indents: Vec<&'a str>,
    /// Bracket nesting depth
    depth: usize,
    /// The current logical line has produced a token
    in_line: bool,
    space: Option<&'a str>,
    line: usize,
}

impl<'a> Layout<'a> {
    fn feed(&mut self, pair: Pair<'a, Rule>) -> Result<(), LexError> {
        let text = pair.as_str();
        match pair.as_rule() {
            Rule::space => {
                self.space = Some(text);
            }
            Rule::continuation => {
                self.space = None;
                self.line += 1;
            }
            Rule::comment => {
                self.space = None;
                self.push(TokenKind::Comment, text);
            }
            Rule::newline => {
                let kind = if self.in_line && self.depth == 0 {
                    self.in_line = false;
                    TokenKind::Newline
                } else {
                    TokenKind::Nl
                };
                self.space = None;
                self.push(kind, text);
                self.line += 1;
            }
            Rule::string => self.content(TokenKind::String, text)?,
            Rule::number => self.content(TokenKind::Number, text)?,
            Rule::name => self.content(TokenKind::Name, text)?,
            Rule::op => {
                match text {
                    "(" | "[" | "{" => self.depth += 1,
                    ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                    _ => {}
                }
                self.content(TokenKind::Op, text)?;
            }
            Rule::error => self.content(TokenKind::ErrorToken, text)?,
            _ => {}
        }
        Ok(())
    }

    fn content(&mut self, kind: TokenKind, text: &'a str) -> Result<(), LexError> {
        let space = self.space.take();
        if !self.in_line && self.depth == 0 {
            self.indent(space.unwrap_or(""))?;
        } else if kind == TokenKind::ErrorToken {
            for c in space.unwrap_or("").chars() {
                self.push(TokenKind::ErrorToken, c.to_string());
            }
        }
        self.in_line = true;
        self.push(kind, text);
        self.line += text.matches('\n').count();
        Ok(())
    }

    fn indent(&mut self, space: &'a str) -> Result<(), LexError> {
        let current = self.indents.last().map_or(0, |s| s.len());
        if space.len() > current {
            self.indents.push(space);
            self.push(TokenKind::Indent, space);
            return Ok(());
        }
        while self.indents.last().is_some_and(|s| s.len() > space.len()) {
            self.indents.pop();
            self.push(TokenKind::Dedent, "");
        }
        if self.indents.last().map_or(0, |s| s.len()) != space.len() {
            return Err(LexError::InconsistentDedent {
                line: self.line + 1,
            });
        }
        Ok(())
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.tokens.push(Token::new(kind, text));
    }

    fn finish(mut self) -> Result<Vec<Token>, LexError> {
        if self.depth > 0 {
            return Err(LexError::UnexpectedEof {
                line: self.line + 1,
            });
        }
        if self.in_line {
            self.push(TokenKind::Newline, "");
        }
        for _ in 0..self.indents.len() {
            self.push(TokenKind::Dedent, "");
        }
        self.push(TokenKind::EndMarker, "");
        Ok(self.tokens)
    }
}
