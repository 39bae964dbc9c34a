//! Error types for the subscription sync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the subscription sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Subscription endpoint answered with a non-OK status
    #[error("{subscription} Response Status Code: {status}")]
    Fetch {
        /// Remark of the subscription that failed
        subscription: String,
        /// HTTP status code returned by the endpoint
        status: u16,
    },

    /// HTTP transport errors (connection, proxy, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Subscription payload could not be turned into servers
    #[error("Parse error: {0}")]
    Parse(String),

    /// External resolver failures
    ///
    /// Never surfaced to the user: forced resolution degrades to a no-op.
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Server inventory errors
    #[error("Server store error: {0}")]
    Store(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a fetch error for a non-OK status
    pub fn fetch(subscription: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            subscription: subscription.into(),
            status,
        }
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create a server store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
