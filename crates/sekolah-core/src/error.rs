//! Error types shared across the core.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Transport-level failure talking to the content store
    #[error("network error: {0}")]
    Network(String),

    /// The content store answered with a non-success status
    #[error("store error ({status}): {message}")]
    Store { status: u16, message: String },

    /// Malformed payload from the store or IP service
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The visitor's IP address could not be determined
    #[error("could not resolve visitor ip: {0}")]
    IpResolve(String),

    /// Required-field check failed; no remote call was made
    #[error("{0}")]
    Validation(&'static str),

    /// A comment submission is already in flight
    #[error("another submission is already in flight")]
    Busy,

    /// Row missing where one was expected
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
