//! Quarantine archiver.

use crate::{ArchiveError, ArchiveResult, ObjectStore};
use event_envelope::FailureReason;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

const CONTENT_TYPE: &str = "application/json";

/// Body of a quarantined object.
#[derive(Debug, Serialize)]
pub struct QuarantineRecord<'a> {
    pub reason: FailureReason,
    /// The message body exactly as received.
    pub raw: &'a str,
}

/// Successful archival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Archived {
    /// Written under `key`.
    Stored { key: String },
    /// No store configured; nothing was written.
    Skipped,
}

/// Object key for a quarantined message: `{prefix}/{reason}/{message_id}.json`.
///
/// Trailing slashes on the prefix are ignored; an empty prefix yields
/// `{reason}/{message_id}.json`.
pub fn quarantine_key(prefix: &str, reason: FailureReason, message_id: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}/{}.json", reason, message_id)
    } else {
        format!("{}/{}/{}.json", prefix, reason, message_id)
    }
}

/// Routes undeliverable messages to the quarantine store.
#[derive(Clone)]
pub struct QuarantineArchiver {
    store: Option<Arc<dyn ObjectStore>>,
    prefix: String,
}

impl QuarantineArchiver {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            prefix: prefix.into(),
        }
    }

    /// An archiver without a store: every call succeeds without writing.
    pub fn disabled() -> Self {
        Self {
            store: None,
            prefix: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Archive `raw_body` under `reason`.
    ///
    /// An error means the message is neither delivered nor archived and must
    /// be redelivered by the queue.
    pub async fn archive(
        &self,
        message_id: &str,
        raw_body: &str,
        reason: FailureReason,
    ) -> ArchiveResult<Archived> {
        let Some(store) = &self.store else {
            debug!(message_id, %reason, "Quarantine disabled, skipping archive");
            return Ok(Archived::Skipped);
        };

        let key = quarantine_key(&self.prefix, reason, message_id);
        let body = serde_json::to_vec(&QuarantineRecord {
            reason,
            raw: raw_body,
        })?;

        match store.put_object(&key, body, CONTENT_TYPE).await {
            Ok(()) => {
                info!(message_id, %reason, key = %key, "Message quarantined");
                Ok(Archived::Stored { key })
            }
            Err(source) => {
                error!(
                    message_id,
                    %reason,
                    key = %key,
                    error = %source,
                    "Quarantine write failed"
                );
                Err(ArchiveError::WriteFailed { key, source })
            }
        }
    }
}
