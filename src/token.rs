use std::fmt;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    /// Characters the tokenizer does not recognize (`!`, `?`, `` ` ``, ...)
    ErrorToken,
    Comment,
    /// Newline ending a logical line
    Newline,
    /// Newline that does not end a logical line (blank lines, inside brackets)
    Nl,
    Indent,
    Dedent,
    EndMarker,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Name => "NAME",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Op => "OP",
            TokenKind::ErrorToken => "ERRORTOKEN",
            TokenKind::Comment => "COMMENT",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Nl => "NL",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::EndMarker => "ENDMARKER",
        }
    }

    /// Whether a token of this kind ends a physical line
    pub fn is_line_end(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Nl)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `(kind, text)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn name(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Name, text)
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Number, text)
    }

    pub fn op(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Op, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(TokenKind::ErrorToken, text)
    }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl AsRef<Token> for Token {
    fn as_ref(&self) -> &Token {
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.text)
    }
}

/// Render tokens as `text text ... [KIND KIND ...]` for diagnostics
pub fn pretty_format_tokens<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a Token>,
    I::IntoIter: Clone,
{
    let tokens = tokens.into_iter();
    let texts = tokens
        .clone()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let kinds = tokens.map(|t| t.kind.name()).collect::<Vec<_>>().join(" ");
    format!("{} [{}]", texts.escape_debug(), kinds)
}
