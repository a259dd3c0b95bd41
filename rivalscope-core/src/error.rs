//! Error types for rivalscope-core

use thiserror::Error;

/// Main error type for the rivalscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure (connect, timeout, TLS)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON decode error (response body did not match the expected shape)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local cache store error
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of an [`Error::Api`], if that is what this error is.
    pub fn api_status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for rivalscope-core
pub type Result<T> = std::result::Result<T, Error>;
