//! Batch orchestrator.

use crate::{BatchResult, DeliveryOutcome, MessageReport, RawMessage};
use event_envelope::{EnvelopeBuilder, FailureReason};
use futures_util::stream::{self, StreamExt};
use quarantine_archiver::QuarantineArchiver;
use stream_transport::TransportClient;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs every message of a batch through build → send → (quarantine).
///
/// All collaborators are injected; the orchestrator holds no connection
/// state of its own and can be shared across invocations.
#[derive(Clone)]
pub struct BatchOrchestrator {
    builder: EnvelopeBuilder,
    transport: TransportClient,
    archiver: QuarantineArchiver,
    max_concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(
        builder: EnvelopeBuilder,
        transport: TransportClient,
        archiver: QuarantineArchiver,
    ) -> Self {
        Self {
            builder,
            transport,
            archiver,
            max_concurrency: 1,
        }
    }

    /// Process up to `n` messages at once. Each message still retries
    /// sequentially on its own; `1` (the default) processes the batch in order.
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Process a whole batch and return the ids needing redelivery.
    pub async fn process_batch(&self, messages: &[RawMessage]) -> BatchResult {
        self.process_batch_until(messages, None).await
    }

    /// Like [`process_batch`](Self::process_batch), but stops starting new
    /// messages once `deadline` has passed. Messages not started are reported
    /// for redelivery; messages already in flight run to completion.
    pub async fn process_batch_until(
        &self,
        messages: &[RawMessage],
        deadline: Option<Instant>,
    ) -> BatchResult {
        let reports: Vec<(usize, Option<MessageReport>)> = stream::iter(messages.iter().enumerate())
            .map(|(index, message)| async move {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return (index, None);
                }
                (index, Some(self.process_message(message).await))
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut result = BatchResult::default();
        for (index, report) in reports {
            match report {
                Some(report) => result.record(&report),
                None => {
                    let message_id = &messages[index].id;
                    debug!(message_id = %message_id, "Deadline passed, deferring message");
                    result.record_deferred(message_id);
                }
            }
        }

        let summary = result.summary();
        info!(
            messages = messages.len(),
            delivered = summary.delivered,
            archived = summary.archived,
            unarchived = summary.unarchived,
            deferred = summary.deferred,
            "Batch processed"
        );
        result
    }

    /// Resolve a single message to its final outcome.
    pub async fn process_message(&self, message: &RawMessage) -> MessageReport {
        let span = info_span!("message", message_id = %message.id);
        let outcome = self.resolve(message).instrument(span).await;
        MessageReport {
            message_id: message.id.clone(),
            outcome,
        }
    }

    async fn resolve(&self, message: &RawMessage) -> DeliveryOutcome {
        let envelope = match self.builder.build(&message.body) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "Envelope build failed");
                return self.quarantine(message, err.reason()).await;
            }
        };

        match self.transport.send(&envelope).await {
            Ok(delivered) => {
                debug!(
                    envelope_id = %envelope.id,
                    record_id = %delivered.record_id,
                    attempts = delivered.attempts,
                    "Delivered"
                );
                DeliveryOutcome::Delivered {
                    record_id: delivered.record_id,
                }
            }
            Err(err) => {
                warn!(envelope_id = %envelope.id, error = %err, "Delivery failed");
                self.quarantine(message, err.reason()).await
            }
        }
    }

    async fn quarantine(&self, message: &RawMessage, reason: FailureReason) -> DeliveryOutcome {
        match self.archiver.archive(&message.id, &message.body, reason).await {
            Ok(_) => DeliveryOutcome::ArchivedFailure { reason },
            Err(err) => {
                warn!(%reason, error = %err, "Message left for redelivery");
                DeliveryOutcome::UnarchivedFailure { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_envelope::EnvelopeConfig;
    use quarantine_archiver::{MemoryObjectStore, StoreError};
    use std::sync::Arc;
    use std::time::Duration;
    use stream_transport::{MemoryRecordSink, RetryPolicy, SinkError};

    const LIMIT: usize = 1000 * 1024;

    fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new(EnvelopeConfig {
            event_type: "test.event".to_string(),
            source: "tests".to_string(),
            region: "us-east-1".to_string(),
        })
    }

    fn orchestrator(
        sink: Arc<MemoryRecordSink>,
        archiver: QuarantineArchiver,
        limit: usize,
    ) -> BatchOrchestrator {
        BatchOrchestrator::new(
            builder(),
            TransportClient::new(sink, RetryPolicy::default(), limit),
            archiver,
        )
    }

    fn store_archiver(store: &Arc<MemoryObjectStore>) -> QuarantineArchiver {
        QuarantineArchiver::new(store.clone(), "raw/errors")
    }

    fn unreachable_store() -> Arc<MemoryObjectStore> {
        Arc::new(MemoryObjectStore::failing(StoreError::Transport(
            "connection refused".to_string(),
        )))
    }

    #[tokio::test]
    async fn valid_message_is_delivered() {
        let sink = Arc::new(MemoryRecordSink::new());
        let store = Arc::new(MemoryObjectStore::new());
        let orch = orchestrator(sink.clone(), store_archiver(&store), LIMIT);

        let report = orch
            .process_message(&RawMessage::new("m-1", r#"{"payload":[{"a":1}]}"#))
            .await;

        assert!(matches!(report.outcome, DeliveryOutcome::Delivered { .. }));
        assert_eq!(sink.calls(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalid_json_is_archived_with_raw_body() {
        let sink = Arc::new(MemoryRecordSink::new());
        let store = Arc::new(MemoryObjectStore::new());
        let orch = orchestrator(sink.clone(), store_archiver(&store), LIMIT);

        let report = orch.process_message(&RawMessage::new("m-2", "not json")).await;

        assert_eq!(
            report.outcome,
            DeliveryOutcome::ArchivedFailure {
                reason: FailureReason::InvalidJson
            }
        );
        assert_eq!(sink.calls(), 0);
        let object = store.get("raw/errors/invalid_json/m-2.json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&object.body).unwrap();
        assert_eq!(value["raw"], "not json");
    }

    #[tokio::test]
    async fn missing_payload_is_archived() {
        let sink = Arc::new(MemoryRecordSink::new());
        let store = Arc::new(MemoryObjectStore::new());
        let orch = orchestrator(sink.clone(), store_archiver(&store), LIMIT);

        let report = orch
            .process_message(&RawMessage::new("m-3", r#"{"items":[1]}"#))
            .await;

        assert_eq!(
            report.outcome,
            DeliveryOutcome::ArchivedFailure {
                reason: FailureReason::MissingPayload
            }
        );
        assert!(store.get("raw/errors/missing_payload/m-3.json").is_some());
    }

    #[tokio::test]
    async fn oversized_envelope_is_archived_without_transport() {
        let sink = Arc::new(MemoryRecordSink::new());
        let store = Arc::new(MemoryObjectStore::new());
        let orch = orchestrator(sink.clone(), store_archiver(&store), 64);

        let body = format!(r#"{{"payload":["{}"]}}"#, "x".repeat(128));
        let report = orch.process_message(&RawMessage::new("m-4", body)).await;

        assert_eq!(
            report.outcome,
            DeliveryOutcome::ArchivedFailure {
                reason: FailureReason::ExceedsSizeLimit
            }
        );
        assert_eq!(sink.calls(), 0);
        assert!(store
            .get("raw/errors/exceeds_size_limit/m-4.json")
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn archived_failures_leave_result_empty() {
        let sink = Arc::new(MemoryRecordSink::failing(SinkError::service(
            "ThrottlingException",
            "Rate exceeded",
        )));
        let store = Arc::new(MemoryObjectStore::new());
        let orch = orchestrator(sink.clone(), store_archiver(&store), LIMIT);

        let result = orch
            .process_batch(&[
                RawMessage::new("a", r#"{"payload":[1]}"#),
                RawMessage::new("b", "{"),
            ])
            .await;

        assert!(result.is_empty());
        assert_eq!(result.summary().archived, 2);
        assert_eq!(sink.calls(), 3);
        assert!(store.get("raw/errors/put_failed/a.json").is_some());
    }

    #[tokio::test]
    async fn quarantine_disabled_counts_as_archived() {
        let sink = Arc::new(MemoryRecordSink::new());
        let orch = orchestrator(sink, QuarantineArchiver::disabled(), LIMIT);

        let result = orch
            .process_batch(&[RawMessage::new("bad", "not json")])
            .await;

        assert!(result.is_empty());
        assert_eq!(result.summary().archived, 1);
    }

    #[tokio::test]
    async fn archive_failure_reports_id_once() {
        let sink = Arc::new(MemoryRecordSink::new());
        let orch = orchestrator(
            sink,
            QuarantineArchiver::new(unreachable_store(), "raw"),
            LIMIT,
        );

        let result = orch
            .process_batch(&[
                RawMessage::new("ok", r#"{"payload":[]}"#),
                RawMessage::new("bad", "not json"),
            ])
            .await;

        assert_eq!(result.failed_ids(), ["bad".to_string()]);
        assert_eq!(result.summary().unarchived, 1);
        assert_eq!(result.summary().delivered, 1);
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_messages() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![Err(SinkError::service(
            "AccessDeniedException",
            "nope",
        ))]));
        let store = Arc::new(MemoryObjectStore::new());
        let orch = orchestrator(sink.clone(), store_archiver(&store), LIMIT);

        let result = orch
            .process_batch(&[
                RawMessage::new("first", r#"{"payload":[1]}"#),
                RawMessage::new("second", r#"{"payload":[2]}"#),
            ])
            .await;

        assert!(result.is_empty());
        assert_eq!(result.summary().delivered, 1);
        assert_eq!(result.summary().archived, 1);
        assert_eq!(sink.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_defers_every_message() {
        let sink = Arc::new(MemoryRecordSink::new());
        let orch = orchestrator(sink.clone(), QuarantineArchiver::disabled(), LIMIT);
        let deadline = Instant::now();
        tokio::time::advance(Duration::from_millis(1)).await;

        let result = orch
            .process_batch_until(
                &[
                    RawMessage::new("a", r#"{"payload":[]}"#),
                    RawMessage::new("b", r#"{"payload":[]}"#),
                ],
                Some(deadline),
            )
            .await;

        assert_eq!(result.failed_ids(), ["a".to_string(), "b".to_string()]);
        assert_eq!(result.summary().deferred, 2);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_reached_mid_batch_defers_the_rest() {
        let sink = Arc::new(MemoryRecordSink::scripted(vec![
            Err(SinkError::service("ThrottlingException", "slow down")),
            Err(SinkError::service("ThrottlingException", "slow down")),
        ]));
        let orch = orchestrator(sink.clone(), QuarantineArchiver::disabled(), LIMIT);
        let deadline = Instant::now() + Duration::from_millis(100);

        let result = orch
            .process_batch_until(
                &[
                    RawMessage::new("slow", r#"{"payload":[]}"#),
                    RawMessage::new("late", r#"{"payload":[]}"#),
                ],
                Some(deadline),
            )
            .await;

        // "slow" spends 750ms in backoff and is then delivered on attempt 3
        assert_eq!(result.failed_ids(), ["late".to_string()]);
        assert_eq!(result.summary().delivered, 1);
        assert_eq!(result.summary().deferred, 1);
    }

    #[tokio::test]
    async fn concurrent_processing_matches_sequential_result() {
        let sink = Arc::new(MemoryRecordSink::new());
        let orch = orchestrator(
            sink.clone(),
            QuarantineArchiver::new(unreachable_store(), "raw"),
            LIMIT,
        )
        .with_max_concurrency(4);

        let messages: Vec<RawMessage> = (0..10)
            .map(|i| {
                let body = if i % 3 == 0 {
                    "garbage".to_string()
                } else {
                    format!(r#"{{"payload":[{i}]}}"#)
                };
                RawMessage::new(format!("m-{i}"), body)
            })
            .collect();

        let result = orch.process_batch(&messages).await;

        assert_eq!(
            result.failed_ids(),
            ["m-0", "m-3", "m-6", "m-9"].map(String::from)
        );
        assert_eq!(result.summary().delivered, 6);
        assert_eq!(sink.calls(), 6);
    }
}
