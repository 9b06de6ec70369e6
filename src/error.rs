use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::Rule;

/// Failure while turning source text into tokens
#[derive(Debug, Error)]
pub enum LexError {
    #[error("tokenizer grammar failed: {0}")]
    Grammar(#[from] Box<pest::error::Error<Rule>>),

    #[error("line {line}: unindent does not match any outer indentation level")]
    InconsistentDedent { line: usize },

    #[error("line {line}: end of file in multi-line statement")]
    UnexpectedEof { line: usize },
}

/// Failure while expanding a token stream
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("invalid definition `{directive}`: {message}")]
    DefinitionSyntax { directive: String, message: String },

    #[error("couldn't resolve include {reference:?} (searched: {})", display_roots(.roots))]
    IncludeResolution {
        reference: String,
        roots: Vec<PathBuf>,
    },

    #[error("dedent without an open indentation level")]
    MalformedIndentation,

    #[error("expansion of `{name}` exceeded the maximum depth of {limit}")]
    RecursionLimit { name: String, limit: usize },

    #[error("{} includes itself", .path.display())]
    IncludeCycle { path: PathBuf },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("in file included from {}", .path.display())]
    InInclude {
        path: PathBuf,
        #[source]
        source: Box<PreprocessError>,
    },
}

impl PreprocessError {
    pub(crate) fn definition(directive: impl Into<String>, message: impl Into<String>) -> Self {
        PreprocessError::DefinitionSyntax {
            directive: directive.into(),
            message: message.into(),
        }
    }

    /// The innermost error, skipping include context wrappers
    pub fn root_cause(&self) -> &PreprocessError {
        match self {
            PreprocessError::InInclude { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn display_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = PreprocessError> = std::result::Result<T, E>;
