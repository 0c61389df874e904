//! Canonical event envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope schema version.
pub const SCHEMA_VERSION: &str = "0";

/// Canonical record delivered to the streaming sink.
///
/// Field order here is the field order on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub schema_version: String,
    /// Generated per build; never derived from the queue message id.
    pub id: String,
    pub event_type: String,
    pub source: String,
    /// Always null for now.
    pub account: Option<String>,
    /// UTC, second precision, `Z` suffix.
    pub timestamp: String,
    pub region: String,
    pub resources: Vec<String>,
    pub detail: EnvelopeDetail,
}

/// Envelope body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeDetail {
    /// The caller's `payload` array, unchanged. Numbers keep their input
    /// text and objects their key order.
    pub payload: Vec<Value>,
}

impl Envelope {
    /// Compact JSON encoding, as sent to the sink.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
