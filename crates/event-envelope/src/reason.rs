//! Failure reasons recorded with quarantined messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a message could not be delivered.
///
/// The wire form (`as_str`) is used both inside the quarantine object and as
/// the grouping segment of its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Body was not parseable JSON.
    InvalidJson,
    /// Body was JSON but not an object with an array `payload`.
    MissingPayload,
    /// Encoded envelope exceeded the sink's record size ceiling.
    ExceedsSizeLimit,
    /// Delivery to the sink failed after the retry policy gave up.
    PutFailed,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidJson => "invalid_json",
            Self::MissingPayload => "missing_payload",
            Self::ExceedsSizeLimit => "exceeds_size_limit",
            Self::PutFailed => "put_failed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
