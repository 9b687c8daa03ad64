//! Error types for the doselog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for doselog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error outside of row parsing (writer failures, broken headers)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A row of the backing file could not be turned into an entry.
    /// `line` is 1-based and counts the header row.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Update/delete target does not resolve to any entry
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A field value is outside its accepted range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(line: u64, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
