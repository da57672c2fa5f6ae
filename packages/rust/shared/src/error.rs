//! Error types for gameenrich.
//!
//! Library crates use [`GameEnrichError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all gameenrich operations.
#[derive(Debug, thiserror::Error)]
pub enum GameEnrichError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The model API key is missing or unusable.
    #[error("credential error: {0}")]
    Credential(String),

    /// Network/HTTP error while talking to the model service.
    #[error("network error: {0}")]
    Network(String),

    /// The model service rejected or failed a request.
    #[error("model error: {0}")]
    Model(String),

    /// Model response or user input could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Reading or writing the delimited table failed.
    #[error("table error: {0}")]
    Table(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing required column, bad flag value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GameEnrichError>;

impl GameEnrichError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a table error from any displayable message.
    pub fn table(msg: impl Into<String>) -> Self {
        Self::Table(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run rather than a single row.
    ///
    /// Network, model and parse failures are absorbed per row by the
    /// enricher. A credential the service rejects mid-run stops further
    /// model calls; everything else stops the process before rows are touched.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Network(_) | Self::Model(_) | Self::Parse { .. })
    }
}
