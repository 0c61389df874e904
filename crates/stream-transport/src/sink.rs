//! Streaming sink contract.

use async_trait::async_trait;
use thiserror::Error;

/// Sink acknowledgment for one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PutRecordOutput {
    /// Present when the sink durably accepted the record. A response
    /// without it counts as a failed attempt.
    pub record_id: Option<String>,
}

impl PutRecordOutput {
    pub fn acknowledged(record_id: impl Into<String>) -> Self {
        Self {
            record_id: Some(record_id.into()),
        }
    }
}

/// Error from a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink answered with an error code.
    #[error("{code}: {message}")]
    Service {
        /// Service error code, e.g. `ThrottlingException`.
        code: String,
        message: String,
    },

    /// The request never got a service answer (connect, TLS, timeout).
    #[error("transport: {0}")]
    Transport(String),
}

impl SinkError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One delivery attempt against the streaming sink.
///
/// Implementations are shared across concurrently processed messages and
/// must not retry internally; pacing is the transport client's job.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn put_record(&self, data: &[u8]) -> Result<PutRecordOutput, SinkError>;
}
