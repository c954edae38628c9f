//! Error types for the pomdrive crate

use thiserror::Error;

/// Main error type for the pomdrive crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("{what} must contain at least one value")]
    EmptyMenu { what: String },

    #[error("{what} must be sorted in ascending order (offending index {index})")]
    UnsortedMenu { what: String, index: usize },

    #[error("action index {index} is out of range (menu has {len} actions)")]
    ActionOutOfRange { index: usize, len: usize },

    #[error("unknown {kind} '{input}'. Expected one of: {expected}")]
    UnknownVariant {
        kind: String,
        input: String,
        expected: String,
    },

    #[error("telemetry file '{path}' contains no decision rows")]
    EmptyTelemetry { path: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// Shorthand for [`Error::InvalidConfiguration`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the operation that failed.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
