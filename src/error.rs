//! Error types for sqltag.
//!
//! Compiling a query never fails. Driver failures are not wrapped here either:
//! `Query::fetch` and `Cursor` hand back the driver's own error type. This enum
//! only covers what the crate itself rejects: malformed text templates,
//! configuration problems and the helpers that talk to sqlx directly.

use thiserror::Error;

/// The main error type for sqltag operations.
#[derive(Debug, Error)]
pub enum SqlTagError {
    /// A text template could not be split into fragments and slots.
    #[error("Template error at position {position}: {message}")]
    Template { position: usize, message: String },

    /// Fragment and argument counts do not line up.
    #[error("Template has {fragments} fragment(s) for {args} argument(s); expected {expected}")]
    FragmentCount {
        fragments: usize,
        args: usize,
        expected: usize,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed configuration file.
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value could not be turned into a record.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Database error raised outside of query execution (connecting, pooling).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlTagError {
    /// Create a template error at the given byte position.
    pub fn template(position: usize, message: impl Into<String>) -> Self {
        Self::Template {
            position,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for sqltag operations.
pub type SqlTagResult<T> = Result<T, SqlTagError>;
