//! Error types for quarantine archival.

use thiserror::Error;

/// Error from the underlying object store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("store rejected write: HTTP {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The request did not complete.
    #[error("store unreachable: {0}")]
    Transport(String),

    /// The object URL could not be built.
    #[error("invalid object URL: {0}")]
    InvalidUrl(String),
}

/// Archival failure. The message still needs redelivery.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive write failed for {key}: {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("archive encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type alias using ArchiveError.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
