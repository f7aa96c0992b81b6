//! Error Handling for the language
//!
//! This module defines the error system used throughout the lexer, parser,
//! analyser and evaluator. Each pipeline stage has its own error variant,
//! carrying an optional source position and a free-form message. The first
//! error encountered halts the pipeline; errors are never recovered from
//! internally.
//!
//! ## Error Flow
//!
//! ```text
//! Source Code → Lexer → Parser → Analyser → Evaluator → Output
//!      |          |        |         |           |
//!  LexError  ParseError SemanticError RuntimeError Success
//! ```

use std::error::Error;
use std::fmt;

/// A 1-based source location, attached to most error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line {}, Column {}", self.line, self.column)
    }
}

/// Comprehensive error type for every stage of the language pipeline.
///
/// One variant per pipeline stage, each carrying an optional [`Position`]
/// and a message. The driver owns [`LangError::Io`] for file-read failures
/// that never reach the pipeline at all.
#[derive(Debug, Clone)]
pub enum LangError {
    /// Lexical analysis error during tokenization: invalid characters,
    /// unterminated strings, malformed numbers, stray `&`/`|`.
    Lexer { message: String, position: Option<Position> },

    /// Syntax error during parsing: missing tokens, malformed statements,
    /// an assignment target that isn't a bare identifier.
    Parser { message: String, position: Option<Position> },

    /// Semantic error raised by the analyser before any code runs:
    /// redeclaration, undefined names, arity mismatches, misplaced
    /// `return`/`break`.
    Semantic { message: String, position: Option<Position> },

    /// Runtime error raised by the evaluator: type errors, division by
    /// zero, undefined variables, loop limit exceeded.
    Runtime { message: String, position: Option<Position> },

    /// Ambient driver-only error: the source file could not be read.
    /// Never produced by the core pipeline.
    Io(String),
}

impl LangError {
    pub fn lexer(message: impl Into<String>, position: Position) -> Self {
        LangError::Lexer { message: message.into(), position: Some(position) }
    }

    pub fn parser(message: impl Into<String>, position: Position) -> Self {
        LangError::Parser { message: message.into(), position: Some(position) }
    }

    pub fn semantic(message: impl Into<String>, position: Position) -> Self {
        LangError::Semantic { message: message.into(), position: Some(position) }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        LangError::Runtime { message: message.into(), position: None }
    }

    pub fn runtime_at(message: impl Into<String>, position: Position) -> Self {
        LangError::Runtime { message: message.into(), position: Some(position) }
    }
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn render(
            f: &mut fmt::Formatter,
            label: &str,
            message: &str,
            position: &Option<Position>,
        ) -> fmt::Result {
            match position {
                Some(pos) => write!(f, "{} ({}): {}", label, pos, message),
                None => write!(f, "{}: {}", label, message),
            }
        }

        match self {
            LangError::Lexer { message, position } => render(f, "Lexer Error", message, position),
            LangError::Parser { message, position } => render(f, "Parser Error", message, position),
            LangError::Semantic { message, position } => {
                render(f, "Semantic Error", message, position)
            }
            LangError::Runtime { message, position } => {
                render(f, "Runtime Error", message, position)
            }
            LangError::Io(message) => write!(f, "IO Error: {}", message),
        }
    }
}

impl Error for LangError {}

impl From<std::io::Error> for LangError {
    fn from(err: std::io::Error) -> Self {
        LangError::Io(err.to_string())
    }
}

/// Convenience alias for results that can fail with a [`LangError`].
pub type Result<T> = std::result::Result<T, LangError>;
