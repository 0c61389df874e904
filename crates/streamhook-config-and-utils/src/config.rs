//! Configuration management for the pipeline.
//!
//! Values are resolved in three layers: built-in defaults, an optional JSON
//! file, then environment variables. The delivery stream name has no default;
//! a configuration without one fails validation and the process must not
//! start.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default region used for envelopes and derived endpoints.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default key prefix for quarantined messages.
pub const DEFAULT_ERROR_EVENTS_PREFIX: &str = "raw/cpp-v2-errors";
/// Default envelope `eventType`.
pub const DEFAULT_EVENT_TYPE: &str = "streamhook.event";
/// Default envelope `source`.
pub const DEFAULT_EVENT_SOURCE: &str = "cpp-api-streamhook";
/// Largest encoded envelope accepted by the streaming sink (~1 MB).
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1000 * 1024;
/// Total delivery attempts per message.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// First backoff delay; doubles on every further attempt.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 250;

const DEFAULT_MAX_CONCURRENCY: usize = 1;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Delivery stream name. Mandatory.
    pub stream_name: String,
    /// Streaming sink endpoint. Derived from `region` when unset.
    pub sink_endpoint: Option<String>,
    /// Region stamped on every envelope.
    pub region: String,
    /// Quarantine bucket. Quarantine is disabled when unset.
    pub events_bucket: Option<String>,
    /// Object store endpoint. Derived from `region` when unset.
    pub store_endpoint: Option<String>,
    /// Key prefix for quarantined objects.
    pub error_events_prefix: String,
    /// Envelope `eventType`.
    pub event_type: String,
    /// Envelope `source`.
    pub event_source: String,
    /// Encoded envelope size ceiling in bytes.
    pub max_record_bytes: usize,
    /// Total delivery attempts per message.
    pub max_attempts: u32,
    /// Backoff base in milliseconds.
    pub backoff_base_ms: u64,
    /// Messages processed concurrently within one batch.
    pub max_concurrency: usize,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// Optional bearer token sent to the sink and the store.
    pub auth_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            stream_name: String::new(),
            sink_endpoint: None,
            region: DEFAULT_REGION.to_string(),
            events_bucket: None,
            store_endpoint: None,
            error_events_prefix: DEFAULT_ERROR_EVENTS_PREFIX.to_string(),
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            event_source: DEFAULT_EVENT_SOURCE.to_string(),
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth_token: None,
        }
    }
}

impl Config {
    /// Resolve configuration from defaults, an optional file, and the
    /// process environment, then validate it.
    pub fn load(file: Option<&Path>) -> CoreResult<Self> {
        Self::load_with(file, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup.
    pub fn load_with<F>(file: Option<&Path>, lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific JSON file. Missing keys keep
    /// their defaults.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from environment variables. Empty values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(v) = get("STREAMHOOK_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("FIREHOSE_STREAM") {
            self.stream_name = v;
        }
        if let Some(v) = get("FIREHOSE_ENDPOINT") {
            self.sink_endpoint = Some(v);
        }
        if let Some(v) = get("REGION") {
            self.region = v;
        }
        if let Some(v) = get("EVENTS_BUCKET") {
            self.events_bucket = Some(v);
        }
        if let Some(v) = get("EVENTS_STORE_ENDPOINT") {
            self.store_endpoint = Some(v);
        }
        if let Some(v) = get("ERROR_EVENTS_PREFIX") {
            self.error_events_prefix = v;
        }
        if let Some(v) = get("DETAIL_TYPE") {
            self.event_type = v;
        }
        if let Some(v) = get("EVENT_SOURCE") {
            self.event_source = v;
        }
        if let Some(v) = get("MAX_RECORD_BYTES") {
            self.max_record_bytes = parse_env("MAX_RECORD_BYTES", &v)?;
        }
        if let Some(v) = get("MAX_LOCAL_RETRIES") {
            self.max_attempts = parse_env("MAX_LOCAL_RETRIES", &v)?;
        }
        if let Some(v) = get("BACKOFF_BASE_MS") {
            self.backoff_base_ms = parse_env("BACKOFF_BASE_MS", &v)?;
        }
        if let Some(v) = get("MAX_CONCURRENCY") {
            self.max_concurrency = parse_env("MAX_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("STREAMHOOK_AUTH_TOKEN") {
            self.auth_token = Some(v);
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.stream_name.trim().is_empty() {
            return Err(CoreError::Config(
                "delivery stream name is required (FIREHOSE_STREAM)".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.max_record_bytes == 0 {
            return Err(CoreError::Config("max_record_bytes must be positive".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(CoreError::Config("max_concurrency must be at least 1".to_string()));
        }
        self.sink_endpoint()?;
        if self.events_bucket.is_some() {
            self.store_endpoint()?;
        }
        Ok(())
    }

    /// Streaming sink endpoint as a parsed URL.
    pub fn sink_endpoint(&self) -> CoreResult<Url> {
        let raw = self
            .sink_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://firehose.{}.amazonaws.com", self.region));
        Url::parse(&raw).map_err(CoreError::from)
    }

    /// Object store endpoint as a parsed URL.
    pub fn store_endpoint(&self) -> CoreResult<Url> {
        let raw = self
            .store_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region));
        Url::parse(&raw).map_err(CoreError::from)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> CoreResult<T> {
    raw.parse::<T>()
        .map_err(|_| CoreError::Config(format!("{name} has an invalid value: {raw}")))
}
