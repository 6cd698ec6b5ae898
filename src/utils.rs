use std::fmt;
use std::io;
use thiserror::Error;

/// Custom error types for the grammar generator
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Malformed rule: expected `<name> ::= ...`{}", marker(.line, .offset, &1))]
    MalformedRule { offset: usize, line: String },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Recursion limit of {depth} exceeded while expanding <{symbol}>")]
    RecursionLimit { symbol: String, depth: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<GrammarError>,
    },
}

impl GrammarError {
    /// Strip any line-number wrapping and return the underlying error
    pub fn root(&self) -> &GrammarError {
        match self {
            GrammarError::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// A lexical error located at a character offset of the source line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at column {offset}{}", marker(.line, .offset, &1))]
pub struct LexError {
    pub offset: usize,
    pub kind: LexErrorKind,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// `<` without a closing `>`
    UnterminatedNonTerminal,
    /// `"` without a closing `"`
    UnterminatedString,
    /// A character or symbol run that is not part of the token table
    UnknownToken(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnterminatedNonTerminal => {
                write!(f, "unterminated non-terminal, expected '>' before end of line")
            }
            LexErrorKind::UnterminatedString => {
                write!(f, "unterminated string literal, expected '\"' before end of line")
            }
            LexErrorKind::UnknownToken(text) => write!(f, "unknown token '{}'", text),
        }
    }
}

/// A syntax error located at the token that triggered it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at column {offset}{}", marker(.line, .offset, .width))]
pub struct ParseError {
    pub offset: usize,
    pub width: usize,
    pub kind: ParseErrorKind,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No primary expression can start at the current token
    ExpectedExpression { found: String },
    /// A group opener without its matching closer
    UnmatchedDelimiter {
        open: char,
        expected: char,
        found: String,
    },
    /// `min*max` where max is smaller than min
    BoundViolation { min: u32, max: u32 },
    /// A repetition count that does not fit the count type
    InvalidCount(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::ExpectedExpression { found } => {
                write!(f, "expected expression, got {}", found)
            }
            ParseErrorKind::UnmatchedDelimiter {
                open,
                expected,
                found,
            } => write!(
                f,
                "unmatched '{}': expected '{}', got {}",
                open, expected, found
            ),
            ParseErrorKind::BoundViolation { min, max } => write!(
                f,
                "max repeat count ({}) must not be less than min repeat count ({})",
                max, min
            ),
            ParseErrorKind::InvalidCount(text) => {
                write!(f, "repeat count '{}' is out of range", text)
            }
        }
    }
}

/// Render `line` with a marker under `width` characters starting at `offset`.
///
/// The result starts with a newline so it can be appended to a one-line message.
pub fn point_to(line: &str, offset: usize, width: usize) -> String {
    let line = line.trim_end_matches(['\r', '\n']);
    format!(
        "\n{}\n{}{}",
        line,
        " ".repeat(offset),
        "^".repeat(width.max(1))
    )
}

// Adapter for error display attributes, which hand fields over by reference.
fn marker(line: &str, offset: &usize, width: &usize) -> String {
    point_to(line, *offset, *width)
}
