//! Per-message outcomes and the aggregated batch result.

use event_envelope::FailureReason;

/// Final outcome of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The sink acknowledged the envelope.
    Delivered { record_id: String },
    /// Not delivered, but durably quarantined (or quarantine is disabled).
    ArchivedFailure { reason: FailureReason },
    /// Neither delivered nor quarantined. Must be redelivered.
    UnarchivedFailure { reason: FailureReason },
}

impl DeliveryOutcome {
    pub fn needs_redelivery(&self) -> bool {
        matches!(self, Self::UnarchivedFailure { .. })
    }
}

/// Outcome of one message, tagged with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReport {
    pub message_id: String,
    pub outcome: DeliveryOutcome,
}

/// Outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub delivered: usize,
    pub archived: usize,
    pub unarchived: usize,
    /// Not started before the deadline.
    pub deferred: usize,
}

/// Ids the queue must redeliver.
///
/// Set semantics: an id is kept once, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    failed: Vec<String>,
    summary: BatchSummary,
}

impl BatchResult {
    pub fn failed_ids(&self) -> &[String] {
        &self.failed
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.failed.iter().any(|id| id == message_id)
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// Mark `message_id` for redelivery. Returns false if it already was.
    pub fn record_failure(&mut self, message_id: impl Into<String>) -> bool {
        let message_id = message_id.into();
        if self.contains(&message_id) {
            return false;
        }
        self.failed.push(message_id);
        true
    }

    pub(crate) fn record(&mut self, report: &MessageReport) {
        match &report.outcome {
            DeliveryOutcome::Delivered { .. } => self.summary.delivered += 1,
            DeliveryOutcome::ArchivedFailure { .. } => self.summary.archived += 1,
            DeliveryOutcome::UnarchivedFailure { .. } => {
                self.summary.unarchived += 1;
                self.record_failure(report.message_id.as_str());
            }
        }
    }

    pub(crate) fn record_deferred(&mut self, message_id: &str) {
        self.summary.deferred += 1;
        self.record_failure(message_id);
    }
}
