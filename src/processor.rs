use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::definition::{self, Definitions, Replacement};
use crate::error::{PreprocessError, Result};
use crate::include;
use crate::lookahead::LookAhead;
use crate::matcher::{Pattern, match_tokens};
use crate::parser::PythonParser;
use crate::token::{Token, TokenKind};
use crate::untokenize::untokenize;

/// Indentation added by each synthetic `?INDENT`
pub const INDENT_STEP: &str = "  ";

/// Result of expanding a token stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub definitions: Definitions,
    pub tokens: Vec<Token>,
}

/// Result of preprocessing source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub definitions: Definitions,
    pub tokens: Vec<Token>,
    /// Source text rebuilt from `tokens`
    pub source: String,
    /// Definitions and output, when debug mode is on
    pub report: Option<String>,
}

/// Open indentation levels, innermost last
///
/// Each level stores only the indentation it adds, so the levels
/// concatenated give the full indentation of the current line.
#[derive(Debug, Clone, Default)]
struct IndentStack(Vec<String>);

impl IndentStack {
    fn current(&self) -> String {
        self.0.concat()
    }

    /// Text for a new synthetic level
    fn next_level(&self) -> String {
        self.current() + INDENT_STEP
    }

    fn observe(&mut self, token: &Token) -> Result<()> {
        match token.kind {
            TokenKind::Indent => {
                let current = self.current();
                let level = token
                    .text
                    .strip_prefix(current.as_str())
                    .filter(|rest| !rest.is_empty())
                    .unwrap_or(&token.text);
                self.0.push(level.to_string());
            }
            TokenKind::Dedent => {
                self.0.pop().ok_or(PreprocessError::MalformedIndentation)?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Token waiting in the cursor, with the number of expansions behind it
#[derive(Debug, Clone)]
struct Pending {
    token: Token,
    depth: usize,
}

impl AsRef<Token> for Pending {
    fn as_ref(&self) -> &Token {
        &self.token
    }
}

fn sentinel(directive: &str) -> [Pattern; 2] {
    [
        Pattern::Exact(Token::error("!")),
        Pattern::Exact(Token::name(directive)),
    ]
}

/// Expands `!define` macros and `!include` directives in a token stream
pub struct Expander<'c> {
    config: &'c Config,
    definitions: Definitions,
    output: Vec<Token>,
    indentation: IndentStack,
    define_sentinel: [Pattern; 2],
    include_sentinel: [Pattern; 2],
    /// Canonical paths of the files being included, outermost first
    include_chain: Vec<PathBuf>,
}

impl<'c> Expander<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self::with_include_chain(config, Vec::new())
    }

    fn with_include_chain(config: &'c Config, include_chain: Vec<PathBuf>) -> Self {
        Self {
            config,
            definitions: Definitions::new(),
            output: Vec::new(),
            indentation: IndentStack::default(),
            define_sentinel: sentinel("define"),
            include_sentinel: sentinel("include"),
            include_chain,
        }
    }

    /// Expand all directives and macros in `tokens` (main entry point)
    pub fn expand<I>(mut self, tokens: I) -> Result<Expansion>
    where
        I: IntoIterator<Item = Token>,
    {
        let mut cursor = LookAhead::new(
            tokens
                .into_iter()
                .map(|token| Pending { token, depth: 0 }),
        );
        self.run(&mut cursor)?;
        Ok(Expansion {
            definitions: self.definitions,
            tokens: self.output,
        })
    }

    fn run<I>(&mut self, cursor: &mut LookAhead<I>) -> Result<()>
    where
        I: Iterator<Item = Pending>,
    {
        // Macros are tried only after a token was emitted or expanded, never
        // at the start of the stream or right after a directive.
        let mut expandable = false;
        loop {
            if match_tokens(cursor, &self.define_sentinel).is_some() {
                cursor.advance(self.define_sentinel.len());
                let definition = definition::parse_definition(cursor)?;
                debug!(%definition, "defined macro");
                self.definitions.define(definition);
                expandable = false;
                continue;
            }

            if match_tokens(cursor, &self.include_sentinel).is_some() {
                cursor.advance(self.include_sentinel.len());
                let reference = definition::parse_include_reference(cursor);
                self.include(&reference)?;
                expandable = false;
                continue;
            }

            if expandable {
                if let Some(replacement) = self.expand_at(cursor)? {
                    cursor.push_front(replacement);
                    continue;
                }
            }

            let Some(next) = cursor.next() else {
                break;
            };
            trace!(token = %next.token, "emit");
            self.indentation.observe(&next.token)?;
            self.output.push(next.token);
            expandable = true;
        }
        Ok(())
    }

    /// Replace the first macro matching at the cursor
    ///
    /// Consumes the invocation and returns the tokens it expands to, or
    /// `None` when no definition matches.
    fn expand_at<I>(&self, cursor: &mut LookAhead<I>) -> Result<Option<Vec<Pending>>>
    where
        I: Iterator<Item = Pending>,
    {
        let found = self
            .definitions
            .iter()
            .find_map(|def| match_tokens(cursor, &def.name).map(|matched| (def, matched)));
        let Some((def, matched)) = found else {
            return Ok(None);
        };

        let depth = 1 + matched.iter().map(|p| p.depth).max().unwrap_or(0);
        if depth > self.config.max_expansion_depth {
            return Err(PreprocessError::RecursionLimit {
                name: def.name_text(),
                limit: self.config.max_expansion_depth,
            });
        }

        // Synthetic indents nest on top of whatever the replacement opens before them
        let mut levels = self.indentation.clone();
        let mut replacement = Vec::with_capacity(def.replacement.len());
        for item in &def.replacement {
            let token = match item {
                Replacement::Literal(token) => token.clone(),
                Replacement::BackRef(i) => matched[*i].token.clone(),
                Replacement::Indent => Token::new(TokenKind::Indent, levels.next_level()),
            };
            levels.observe(&token)?;
            replacement.push(Pending { token, depth });
        }

        debug!(name = %def.name_text(), depth, "expanded macro");
        cursor.advance(def.name.len());
        Ok(Some(replacement))
    }

    fn include(&mut self, reference: &str) -> Result<()> {
        let path = include::resolve(reference, &self.config.search_roots)?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if self.include_chain.contains(&canonical) {
            return Err(PreprocessError::IncludeCycle { path });
        }

        let source = fs::read_to_string(&path).map_err(|source| PreprocessError::Io {
            path: path.clone(),
            source,
        })?;

        let mut chain = self.include_chain.clone();
        chain.push(canonical);
        let included = Self::expand_included(self.config, chain, &source).map_err(|source| {
            PreprocessError::InInclude {
                path: path.clone(),
                source: Box::new(source),
            }
        })?;

        debug!(
            path = %path.display(),
            definitions = included.definitions.len(),
            tokens = included.tokens.len(),
            "included file"
        );
        self.definitions.extend(included.definitions);
        self.output.extend(included.tokens);
        Ok(())
    }

    fn expand_included(config: &Config, chain: Vec<PathBuf>, source: &str) -> Result<Expansion> {
        let tokens = PythonParser::tokenize(source)?;
        // the included ENDMARKER must not end the including stream
        Expander::with_include_chain(config, chain).expand(
            tokens
                .into_iter()
                .take_while(|t| t.kind != TokenKind::EndMarker),
        )
    }
}

/// Expand a token stream with the given configuration
pub fn expand<I>(tokens: I, config: &Config) -> Result<Expansion>
where
    I: IntoIterator<Item = Token>,
{
    Expander::new(config).expand(tokens)
}

static CODING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\x0C]*#.*coding[\w-]*[:=][ \t]*pypp\b").expect("coding marker regex is valid")
});

/// Remove a `# coding: pypp` declaration from the first two lines
pub fn strip_coding_marker(source: &str) -> Cow<'_, str> {
    let mut offset = 0;
    for line in source.split_inclusive('\n').take(2) {
        if CODING_MARKER.is_match(line) {
            let mut stripped = String::with_capacity(source.len());
            stripped.push_str(&source[..offset]);
            stripped.push_str(&source[offset + line.len()..]);
            return Cow::Owned(stripped);
        }
        offset += line.len();
    }
    Cow::Borrowed(source)
}

/// Tokenize, expand and rebuild source text
pub fn preprocess(source: &str, config: &Config) -> Result<Preprocessed> {
    let source = strip_coding_marker(source);
    let tokens = PythonParser::tokenize(&source)?;
    let Expansion {
        definitions,
        tokens,
    } = expand(tokens, config)?;
    let text = untokenize(&tokens);
    info!(
        definitions = definitions.len(),
        tokens = tokens.len(),
        "preprocessed source"
    );

    let report = config.debug.then(|| debug_report(&definitions, &text));
    Ok(Preprocessed {
        definitions,
        tokens,
        source: text,
        report,
    })
}

fn debug_report(definitions: &Definitions, source: &str) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "{:-^80}", " BEGIN PYPP MACROS ");
    for definition in definitions {
        let _ = writeln!(report, "{definition}");
    }
    let _ = writeln!(report, "{:-^80}", " END MACROS ");
    let _ = writeln!(report, "{:-^80}", " BEGIN PYPP OUTPUT ");
    let _ = writeln!(report, "{source}");
    let _ = writeln!(report, "{:-^80}", " END PYPP OUTPUT ");
    report
}
