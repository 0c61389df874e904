//! Core error types for startup and configuration.

use thiserror::Error;

/// Core error type for configuration loading and validation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or invalid configuration value. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
