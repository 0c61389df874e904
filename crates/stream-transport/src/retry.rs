//! Retry policy for sink delivery.
//!
//! Failures are first reduced to a [`FailureCause`] by [`classify`]; the
//! policy then decides from the attempt number and the cause alone.

use crate::SinkError;
use std::fmt;
use std::time::Duration;

const THROTTLING: &str = "ThrottlingException";
const SERVICE_UNAVAILABLE: &str = "ServiceUnavailableException";
const INTERNAL_FAILURE: &str = "InternalFailure";
const MISSING_RECORD_ID: &str = "MissingRecordId";
const TRANSPORT: &str = "TransportError";

/// Classified cause of a failed delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Throttling,
    ServiceUnavailable,
    InternalFailure,
    /// The sink answered without a record id.
    MissingRecordId,
    /// Any other code, including transport-level errors.
    Other(String),
}

impl FailureCause {
    /// Throttling, unavailability, internal failures and acknowledgments
    /// without a record id are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttling
                | Self::ServiceUnavailable
                | Self::InternalFailure
                | Self::MissingRecordId
        )
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Throttling => THROTTLING,
            Self::ServiceUnavailable => SERVICE_UNAVAILABLE,
            Self::InternalFailure => INTERNAL_FAILURE,
            Self::MissingRecordId => MISSING_RECORD_ID,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Map a service error code to a cause.
pub fn classify_code(code: &str) -> FailureCause {
    match code {
        THROTTLING => FailureCause::Throttling,
        SERVICE_UNAVAILABLE => FailureCause::ServiceUnavailable,
        INTERNAL_FAILURE => FailureCause::InternalFailure,
        other => FailureCause::Other(other.to_string()),
    }
}

/// Map a sink error to a cause.
pub fn classify(error: &SinkError) -> FailureCause {
    match error {
        SinkError::Service { code, .. } => classify_code(code),
        SinkError::Transport(_) => FailureCause::Other(TRANSPORT.to_string()),
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Bounded retry with exponential backoff.
///
/// `delay = backoff_base * 2^(attempt - 1)`; with the defaults (3 attempts,
/// 250ms base) a transient failure is retried after 250ms and then 500ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Decide after `attempt` (1-based) failed with `cause`.
    pub fn decide(&self, attempt: u32, cause: &FailureCause) -> RetryDecision {
        if !cause.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.backoff(attempt))
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1);
        let multiplier = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(multiplier)
    }
}
