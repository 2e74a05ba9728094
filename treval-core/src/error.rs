//! Error types for treval-core.

use thiserror::Error;

/// Result type for treval-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for treval-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A run or qrels line could not be parsed.
    #[error("Parse error at line {line}: {msg}")]
    Parse {
        /// 1-based line number in the source.
        line: usize,
        /// What was wrong with the line.
        msg: String,
    },

    /// A (topic, document) lookup found nothing.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a parse error for a given line.
    #[must_use]
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            msg: msg.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
