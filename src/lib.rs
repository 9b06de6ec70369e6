//! Token-level macro preprocessor for Python-style source.
//!
//! `!define NAME replacement` and `` !define `WIDE NAME` replacement ``
//! declare macros, `!include path` splices in another file along with its
//! macros. [`expand`] works on an existing token stream; [`preprocess`]
//! goes from source text to source text.

pub mod config;
pub mod definition;
pub mod error;
pub mod include;
pub mod lookahead;
pub mod matcher;
pub mod parser;
pub mod processor;
pub mod token;
pub mod untokenize;

pub use config::Config;
pub use definition::{Definition, Definitions, Replacement};
pub use error::{LexError, PreprocessError};
pub use matcher::Pattern;
pub use processor::{Expander, Expansion, Preprocessed, expand, preprocess};
pub use token::{Token, TokenKind, pretty_format_tokens};
pub use untokenize::untokenize;

/// Tokenize Python-style source text
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    parser::PythonParser::tokenize(source)
}
