//! Validation and envelope construction.

use crate::{Envelope, EnvelopeDetail, EnvelopeError, EnvelopeResult, SCHEMA_VERSION};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Source of the envelope timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Constants stamped on every envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeConfig {
    /// `eventType` field.
    pub event_type: String,
    /// `source` field, identifying the producer.
    pub source: String,
    /// `region` field.
    pub region: String,
}

/// Builds envelopes from raw message bodies.
///
/// Pure apart from one clock read and one random id per envelope, so it can
/// be shared freely across concurrently processed messages.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    config: EnvelopeConfig,
    clock: Arc<dyn Clock>,
}

impl EnvelopeBuilder {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EnvelopeConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Parse and validate a raw body, returning its payload array.
    ///
    /// Non-JSON input is `InvalidJson`. Valid JSON whose top level is not an
    /// object, or whose `payload` is absent or not an array, is
    /// `MissingPayload`.
    pub fn validate(raw_body: &str) -> EnvelopeResult<Vec<Value>> {
        let parsed: Value = serde_json::from_str(raw_body)?;

        let mut object = match parsed {
            Value::Object(object) => object,
            other => {
                return Err(EnvelopeError::MissingPayload {
                    found: json_kind(&other),
                })
            }
        };

        match object.remove("payload") {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(EnvelopeError::MissingPayload {
                found: json_kind(&other),
            }),
            None => Err(EnvelopeError::MissingPayload {
                found: "no payload key",
            }),
        }
    }

    /// Build a fresh envelope for `raw_body`.
    ///
    /// Each call generates a new id and reads the clock, so building the same
    /// body twice yields two distinct envelopes with identical payloads.
    pub fn build(&self, raw_body: &str) -> EnvelopeResult<Envelope> {
        let payload = Self::validate(raw_body)?;
        Ok(self.wrap(payload))
    }

    fn wrap(&self, payload: Vec<Value>) -> Envelope {
        Envelope {
            schema_version: SCHEMA_VERSION.to_string(),
            id: Uuid::new_v4().to_string(),
            event_type: self.config.event_type.clone(),
            source: self.config.source.clone(),
            account: None,
            timestamp: format_timestamp(self.clock.now()),
            region: self.config.region.clone(),
            resources: Vec::new(),
            detail: EnvelopeDetail { payload },
        }
    }
}

/// `2025-04-30T12:18:20Z`: UTC, whole seconds, `Z` suffix.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureReason;
    use chrono::TimeZone;
    use serde_json::json;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn config() -> EnvelopeConfig {
        EnvelopeConfig {
            event_type: "order.created".to_string(),
            source: "cpp-api-streamhook".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    fn fixed_builder() -> EnvelopeBuilder {
        let at = Utc.with_ymd_and_hms(2025, 4, 30, 12, 18, 20).unwrap()
            + chrono::Duration::milliseconds(987);
        EnvelopeBuilder::with_clock(config(), Arc::new(FixedClock(at)))
    }

    #[test]
    fn build_wraps_payload_verbatim() {
        let body = r#"{"payload":[{"z":1,"a":2},3,"x",null,[true]],"extra":"dropped"}"#;
        let envelope = fixed_builder().build(body).unwrap();

        assert_eq!(
            envelope.detail.payload,
            vec![json!({"z":1,"a":2}), json!(3), json!("x"), json!(null), json!([true])]
        );
        assert_eq!(envelope.schema_version, "0");
        assert_eq!(envelope.event_type, "order.created");
        assert_eq!(envelope.source, "cpp-api-streamhook");
        assert_eq!(envelope.region, "us-east-1");
        assert!(envelope.account.is_none());
        assert!(envelope.resources.is_empty());
    }

    #[test]
    fn timestamp_is_truncated_to_seconds_with_z_suffix() {
        let envelope = fixed_builder().build(r#"{"payload":[]}"#).unwrap();
        assert_eq!(envelope.timestamp, "2025-04-30T12:18:20Z");
    }

    #[test]
    fn encoded_envelope_matches_wire_shape() {
        let envelope = fixed_builder().build(r#"{"payload":[{"z":1,"a":2}]}"#).unwrap();
        let encoded = String::from_utf8(envelope.encode().unwrap()).unwrap();

        let expected = format!(
            concat!(
                r#"{{"schemaVersion":"0","id":"{}","eventType":"order.created","#,
                r#""source":"cpp-api-streamhook","account":null,"#,
                r#""timestamp":"2025-04-30T12:18:20Z","region":"us-east-1","#,
                r#""resources":[],"detail":{{"payload":[{{"z":1,"a":2}}]}}}}"#
            ),
            envelope.id
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn payload_numbers_keep_their_text() {
        let body = r#"{"payload":[12345678901234567890123,1e2,0.10,{"n":18446744073709551616}]}"#;
        let envelope = fixed_builder().build(body).unwrap();
        let encoded = String::from_utf8(envelope.encode().unwrap()).unwrap();

        assert!(
            encoded.ends_with(
                r#""detail":{"payload":[12345678901234567890123,1e2,0.10,{"n":18446744073709551616}]}}"#
            ),
            "payload changed: {encoded}"
        );
    }

    #[test]
    fn building_twice_gives_distinct_ids_same_payload() {
        let builder = EnvelopeBuilder::new(config());
        let body = r#"{"payload":[1,2,3]}"#;

        let first = builder.build(body).unwrap();
        let second = builder.build(body).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.detail.payload, second.detail.payload);
        assert!(Uuid::parse_str(&first.id).is_ok());
    }

    #[test]
    fn non_json_is_invalid_json() {
        let err = fixed_builder().build("not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidJson(_)));
        assert_eq!(err.reason(), FailureReason::InvalidJson);
    }

    #[test]
    fn empty_body_is_invalid_json() {
        let err = EnvelopeBuilder::validate("").unwrap_err();
        assert_eq!(err.reason(), FailureReason::InvalidJson);
    }

    #[test]
    fn object_without_payload_is_missing_payload() {
        let err = EnvelopeBuilder::validate(r#"{"data":[1]}"#).unwrap_err();
        assert_eq!(err.reason(), FailureReason::MissingPayload);
    }

    #[test]
    fn non_array_payload_is_missing_payload() {
        let err = EnvelopeBuilder::validate(r#"{"payload":{"a":1}}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingPayload { found: "object" }));
    }

    #[test]
    fn top_level_array_is_missing_payload() {
        let err = EnvelopeBuilder::validate("[1,2]").unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingPayload { found: "array" }));
    }
}
