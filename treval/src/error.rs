//! Error types for treval.

use thiserror::Error;

/// Result type for treval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for treval operations.
///
/// Metrics that leave a denominator unguarded report [`Error::DivisionByZero`]
/// instead of producing `inf`/`NaN`, naming the metric and the topic.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the data model (parsing, lookups).
    #[error(transparent)]
    Core(#[from] treval_core::Error),

    /// A metric hit a zero denominator it does not guard.
    #[error("Division by zero in {metric}: {context}")]
    DivisionByZero {
        /// Metric being computed.
        metric: String,
        /// Topic, class, or other unit that triggered it.
        context: String,
    },

    /// A predicted class is outside the qrels class vocabulary.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// A clustered item has no relevant label in the qrels.
    #[error("Missing label for item: {0}")]
    MissingLabel(String),

    /// A metric name could not be resolved in the registry.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be read or is inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a division-by-zero error.
    #[must_use]
    pub fn division_by_zero(metric: impl Into<String>, context: impl Into<String>) -> Self {
        Error::DivisionByZero {
            metric: metric.into(),
            context: context.into(),
        }
    }

    /// Create an unknown class error.
    #[must_use]
    pub fn unknown_class(class: impl Into<String>) -> Self {
        Error::UnknownClass(class.into())
    }

    /// Create a missing label error.
    #[must_use]
    pub fn missing_label(item: impl Into<String>) -> Self {
        Error::MissingLabel(item.into())
    }

    /// Create an unknown metric error.
    #[must_use]
    pub fn unknown_metric(name: impl Into<String>) -> Self {
        Error::UnknownMetric(name.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a config error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this is a zero-denominator failure.
    #[must_use]
    pub fn is_division_by_zero(&self) -> bool {
        matches!(self, Error::DivisionByZero { .. })
    }
}
