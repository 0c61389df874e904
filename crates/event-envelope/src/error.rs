//! Envelope construction errors.

use crate::FailureReason;
use thiserror::Error;

/// Why a raw body could not become an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The body is not well-formed JSON.
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is JSON but lacks an array-typed `payload` at the top level.
    #[error("body must be a JSON object with an array `payload` ({found})")]
    MissingPayload {
        /// Short description of what was found instead.
        found: &'static str,
    },
}

impl EnvelopeError {
    /// Quarantine reason for this failure.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::InvalidJson(_) => FailureReason::InvalidJson,
            Self::MissingPayload { .. } => FailureReason::MissingPayload,
        }
    }
}

/// Result type alias using EnvelopeError.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
