//! Queue-facing wire types.

use crate::BatchResult;
use serde::{Deserialize, Serialize};

/// Prefix of the placeholder id given to records without a `messageId`.
const UNKNOWN_MESSAGE_ID: &str = "unknown";

/// One queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Queue message id, unique within a batch.
    pub id: String,
    /// Body exactly as received.
    pub body: String,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }
}

/// Queue invocation document: `{"Records": [{"messageId": ..., "body": ...}]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

/// One record of a [`QueueEvent`]. Other queue attributes are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl QueueEvent {
    /// Missing ids become `unknown-{index}` (position in the batch) so each
    /// record keeps its own quarantine key. Missing bodies become the empty
    /// string.
    pub fn into_messages(self) -> Vec<RawMessage> {
        self.records
            .into_iter()
            .enumerate()
            .map(|(index, record)| RawMessage {
                id: record
                    .message_id
                    .unwrap_or_else(|| format!("{UNKNOWN_MESSAGE_ID}-{index}")),
                body: record.body.unwrap_or_default(),
            })
            .collect()
    }
}

/// Partial-batch response: `{"batchItemFailures": [{"itemIdentifier": ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailures {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

impl From<&BatchResult> for BatchItemFailures {
    fn from(result: &BatchResult) -> Self {
        Self {
            batch_item_failures: result
                .failed_ids()
                .iter()
                .map(|id| BatchItemFailure {
                    item_identifier: id.clone(),
                })
                .collect(),
        }
    }
}
