//! Core error types for ldtest

use thiserror::Error;

/// Errors raised while building domain values from user input
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("empty url")]
    EmptyUrl,

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("url {0} has no host")]
    MissingHost(String),

    #[error("url {url} uses unsupported scheme {scheme}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("invalid load test configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
