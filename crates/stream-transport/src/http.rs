//! HTTP record sink speaking the Firehose JSON 1.1 protocol.
//!
//! Request signing is not done here; the endpoint is expected to be a
//! signing egress proxy or a local emulator. An optional bearer token is
//! forwarded when configured.

use crate::{PutRecordOutput, RecordSink, SinkError, TransportResult};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const PUT_RECORD_TARGET: &str = "Firehose_20150804.PutRecord";

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Connection settings for [`HttpRecordSink`].
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub endpoint: Url,
    /// Delivery stream name.
    pub stream_name: String,
    pub timeout: Duration,
    pub auth_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordRequest<'a> {
    delivery_stream_name: &'a str,
    record: RecordData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RecordData {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordResponse {
    #[serde(default)]
    record_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Streaming sink reached over HTTP.
pub struct HttpRecordSink {
    config: HttpSinkConfig,
    client: Client,
}

impl HttpRecordSink {
    pub fn new(config: HttpSinkConfig) -> TransportResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }
}

#[async_trait]
impl RecordSink for HttpRecordSink {
    async fn put_record(&self, data: &[u8]) -> Result<PutRecordOutput, SinkError> {
        let body = encode_put_record(&self.config.stream_name, data)
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        debug!(
            endpoint = %self.config.endpoint,
            stream = %self.config.stream_name,
            bytes = data.len(),
            "PutRecord"
        );

        let mut request = self
            .client
            .post(self.config.endpoint.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", PUT_RECORD_TARGET)
            .body(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if status.is_success() {
            Ok(decode_put_record(&text))
        } else {
            Err(decode_error(status, &text))
        }
    }
}

/// Request body for one PutRecord call.
fn encode_put_record(stream_name: &str, data: &[u8]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&PutRecordRequest {
        delivery_stream_name: stream_name,
        record: RecordData {
            data: BASE64.encode(data),
        },
    })
}

/// An unreadable success body is treated like one without a record id.
fn decode_put_record(body: &str) -> PutRecordOutput {
    let record_id = serde_json::from_str::<PutRecordResponse>(body)
        .ok()
        .and_then(|r| r.record_id)
        .filter(|id| !id.is_empty());
    PutRecordOutput { record_id }
}

/// Build a service error from a non-success response.
///
/// The code comes from `__type` (dropping any `namespace#` prefix); without
/// one it is derived from the HTTP status.
fn decode_error(status: StatusCode, body: &str) -> SinkError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|e| e.error_type.as_deref())
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| status_code_fallback(status));
    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(256).collect());

    SinkError::Service { code, message }
}

fn status_code_fallback(status: StatusCode) -> String {
    match status {
        StatusCode::TOO_MANY_REQUESTS => "ThrottlingException".to_string(),
        StatusCode::SERVICE_UNAVAILABLE => "ServiceUnavailableException".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "InternalFailure".to_string(),
        other => format!("Http{}", other.as_u16()),
    }
}
