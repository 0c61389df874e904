//! Transport error types.

use crate::FailureCause;
use event_envelope::FailureReason;
use thiserror::Error;

/// Terminal outcome of a failed delivery.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Encoded record exceeds the sink ceiling. Never retried.
    #[error("record is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    /// The sink did not acknowledge the record.
    #[error("put failed after {attempts} attempt(s): {cause}")]
    PutFailed { attempts: u32, cause: FailureCause },

    /// Envelope could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl TransportError {
    /// Quarantine reason for this failure.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::TooLarge { .. } => FailureReason::ExceedsSizeLimit,
            Self::PutFailed { .. } | Self::Encode(_) | Self::Client(_) => FailureReason::PutFailed,
        }
    }
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
