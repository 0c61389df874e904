//! Transport client: size-bounded delivery with retry.

use crate::{
    classify, FailureCause, RecordSink, RetryDecision, RetryPolicy, TransportError,
    TransportResult,
};
use event_envelope::Envelope;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// Identifier the sink assigned to the record.
    pub record_id: String,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Delivers envelopes to a [`RecordSink`].
///
/// Attempts for one record run strictly one after another; the backoff sleep
/// between them is the only point where a delivery waits without progress.
#[derive(Clone)]
pub struct TransportClient {
    sink: Arc<dyn RecordSink>,
    policy: RetryPolicy,
    max_record_bytes: usize,
}

impl TransportClient {
    pub fn new(sink: Arc<dyn RecordSink>, policy: RetryPolicy, max_record_bytes: usize) -> Self {
        Self {
            sink,
            policy,
            max_record_bytes,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn max_record_bytes(&self) -> usize {
        self.max_record_bytes
    }

    /// Encode `envelope` compactly and deliver it.
    pub async fn send(&self, envelope: &Envelope) -> TransportResult<Delivered> {
        let data = envelope.encode()?;
        debug!(envelope_id = %envelope.id, bytes = data.len(), "Sending envelope");
        self.send_bytes(&data).await
    }

    /// Deliver an already encoded record.
    ///
    /// Records above the size ceiling fail with `TooLarge` without touching
    /// the sink.
    pub async fn send_bytes(&self, data: &[u8]) -> TransportResult<Delivered> {
        if data.len() > self.max_record_bytes {
            return Err(TransportError::TooLarge {
                size: data.len(),
                limit: self.max_record_bytes,
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;

            let cause = match self.sink.put_record(data).await {
                Ok(output) => match output.record_id {
                    Some(record_id) => {
                        debug!(record_id = %record_id, attempt, "Record acknowledged");
                        return Ok(Delivered {
                            record_id,
                            attempts: attempt,
                        });
                    }
                    None => FailureCause::MissingRecordId,
                },
                Err(err) => {
                    debug!(attempt, error = %err, "Put attempt failed");
                    classify(&err)
                }
            };

            match self.policy.decide(attempt, &cause) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt,
                        delay_ms = whole_millis(delay),
                        cause = %cause,
                        "Put failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    warn!(
                        attempt,
                        cause = %cause,
                        retryable = cause.is_retryable(),
                        "Put failed, giving up"
                    );
                    return Err(TransportError::PutFailed {
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }
    }
}

/// Milliseconds in `delay`, saturating at `u64::MAX`.
fn whole_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryRecordSink, PutRecordOutput, SinkError};
    use event_envelope::{EnvelopeBuilder, EnvelopeConfig};
    use tokio::time::Instant;

    fn client(sink: Arc<MemoryRecordSink>, max_record_bytes: usize) -> TransportClient {
        TransportClient::new(sink, RetryPolicy::default(), max_record_bytes)
    }

    fn envelope(body: &str) -> Envelope {
        EnvelopeBuilder::new(EnvelopeConfig {
            event_type: "test.event".to_string(),
            source: "tests".to_string(),
            region: "us-east-1".to_string(),
        })
        .build(body)
        .unwrap()
    }

    fn assert_between(actual: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(10),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    fn throttled() -> Result<PutRecordOutput, SinkError> {
        Err(SinkError::service("ThrottlingException", "Rate exceeded"))
    }

    #[tokio::test]
    async fn delivers_on_first_attempt() {
        let sink = Arc::new(MemoryRecordSink::new());
        let delivered = client(sink.clone(), 1024)
            .send(&envelope(r#"{"payload":[1]}"#))
            .await
            .unwrap();

        assert_eq!(delivered.attempts, 1);
        assert_eq!(sink.calls(), 1);
        let sent: serde_json::Value = serde_json::from_slice(&sink.records()[0]).unwrap();
        assert_eq!(sent["detail"]["payload"], serde_json::json!([1]));
    }

    #[tokio::test]
    async fn sends_compact_encoding() {
        let sink = Arc::new(MemoryRecordSink::new());
        let env = envelope(r#"{ "payload" : [ 1 , 2 ] }"#);
        client(sink.clone(), 1024).send(&env).await.unwrap();

        assert_eq!(sink.records()[0], env.encode().unwrap());
        assert!(!sink.records()[0].contains(&b' '));
    }

    #[tokio::test]
    async fn oversized_record_never_reaches_sink() {
        let sink = Arc::new(MemoryRecordSink::new());
        let err = client(sink.clone(), 16)
            .send(&envelope(r#"{"payload":["well over sixteen bytes"]}"#))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::TooLarge { limit: 16, .. }));
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn record_exactly_at_limit_is_sent() {
        let sink = Arc::new(MemoryRecordSink::new());
        let data = vec![b'x'; 32];
        client(sink.clone(), 32).send_bytes(&data).await.unwrap();
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn throttling_is_retried_with_backoff_then_gives_up() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![
            throttled(),
            throttled(),
            throttled(),
        ]));
        let started = Instant::now();

        let err = client(sink.clone(), 1024)
            .send_bytes(b"{}")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransportError::PutFailed {
                attempts: 3,
                cause: FailureCause::Throttling
            }
        ));
        assert_eq!(sink.calls(), 3);

        let calls = sink.call_times();
        assert_between(calls[1] - calls[0], 250);
        assert_between(calls[2] - calls[1], 500);
        // no sleep after the final attempt
        assert_between(started.elapsed(), 750);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![
            Err(SinkError::service("ServiceUnavailableException", "busy")),
            Ok(PutRecordOutput::acknowledged("rec-2")),
        ]));

        let delivered = client(sink.clone(), 1024).send_bytes(b"{}").await.unwrap();
        assert_eq!(delivered.record_id, "rec-2");
        assert_eq!(delivered.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_cause_fails_fast() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![Err(SinkError::service(
            "InvalidArgumentException",
            "bad stream",
        ))]));
        let started = Instant::now();

        let err = client(sink.clone(), 1024).send_bytes(b"{}").await.unwrap_err();

        assert!(matches!(err, TransportError::PutFailed { attempts: 1, .. }));
        assert_eq!(sink.calls(), 1);
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_record_id_is_retried_until_exhausted() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![
            Ok(PutRecordOutput::default()),
            Ok(PutRecordOutput::default()),
            Ok(PutRecordOutput::default()),
        ]));

        let err = client(sink.clone(), 1024).send_bytes(b"{}").await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::PutFailed {
                attempts: 3,
                cause: FailureCause::MissingRecordId,
            }
        ));
        assert_eq!(sink.calls(), 3);

        let calls = sink.call_times();
        assert_between(calls[1] - calls[0], 250);
        assert_between(calls[2] - calls[1], 500);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_record_id_then_acknowledged() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![Ok(PutRecordOutput::default())]));

        let delivered = client(sink.clone(), 1024).send_bytes(b"{}").await.unwrap();
        assert_eq!(delivered.attempts, 2);
        assert_eq!(delivered.record_id, "record-2");
        assert_eq!(sink.calls(), 2);
    }

    #[test]
    fn delay_millis_saturate() {
        assert_eq!(whole_millis(Duration::from_millis(750)), 750);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }
}
