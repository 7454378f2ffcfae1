//! Error types for the labelling run.
//!
//! Every variant is fatal: nothing in the crate retries or recovers, errors
//! travel unchanged up to the binary which reports them and exits.

use thiserror::Error;

/// Result type alias for sent-mail-labeler operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Token acquisition failed before any message was fetched
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A page request came back with a non-2xx status
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// Response body was not the expected JSON, or a required field is missing
    #[error("parse error: {0}")]
    Parse(String),

    /// Output file or console failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request never produced a status (connect, TLS, invalid URL, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid configuration input
    #[error("configuration error: {message}")]
    Config {
        message: String,
        /// The setting that was rejected (e.g. "start")
        key: Option<String>,
    },
}

impl Error {
    pub(crate) fn missing_field(field: &str) -> Self {
        Error::Parse(format!("record is missing required field `{field}`"))
    }

    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
