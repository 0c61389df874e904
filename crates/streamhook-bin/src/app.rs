//! Wiring from configuration to a running pipeline.

use anyhow::Context;
use batch_orchestrator::{BatchItemFailures, BatchOrchestrator, QueueEvent};
use event_envelope::{EnvelopeBuilder, EnvelopeConfig};
use quarantine_archiver::{HttpObjectStore, HttpStoreConfig, QuarantineArchiver};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use stream_transport::{HttpRecordSink, HttpSinkConfig, RetryPolicy, TransportClient};
use streamhook_config_and_utils::Config;
use tokio::time::Instant;
use tracing::{info, warn};

const REDACTED: &str = "***";

/// Construct every pipeline component from `config`.
pub fn build_orchestrator(config: &Config) -> anyhow::Result<BatchOrchestrator> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let builder = EnvelopeBuilder::new(EnvelopeConfig {
        event_type: config.event_type.clone(),
        source: config.event_source.clone(),
        region: config.region.clone(),
    });

    let sink = HttpRecordSink::new(HttpSinkConfig {
        endpoint: config.sink_endpoint()?,
        stream_name: config.stream_name.clone(),
        timeout,
        auth_token: config.auth_token.clone(),
    })
    .context("Failed to create sink client")?;
    let transport = TransportClient::new(
        Arc::new(sink),
        RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
        ),
        config.max_record_bytes,
    );

    let archiver = match &config.events_bucket {
        Some(bucket) => {
            let store = HttpObjectStore::new(HttpStoreConfig {
                endpoint: config.store_endpoint()?,
                bucket: bucket.clone(),
                timeout,
                auth_token: config.auth_token.clone(),
            })
            .context("Failed to create quarantine store client")?;
            QuarantineArchiver::new(Arc::new(store), config.error_events_prefix.clone())
        }
        None => {
            warn!("EVENTS_BUCKET not set, undeliverable messages will be dropped");
            QuarantineArchiver::disabled()
        }
    };

    Ok(BatchOrchestrator::new(builder, transport, archiver)
        .with_max_concurrency(config.max_concurrency))
}

/// Read a queue event from `input`, or stdin when `None`.
pub fn read_event(input: Option<&Path>) -> anyhow::Result<QueueEvent> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            raw
        }
    };
    parse_event(&raw)
}

fn parse_event(raw: &str) -> anyhow::Result<QueueEvent> {
    serde_json::from_str(raw).context("Input is not a queue event document")
}

/// Process one queue event and print the partial-batch response on stdout.
pub async fn run_process(
    config: &Config,
    input: Option<&Path>,
    deadline_ms: Option<u64>,
) -> anyhow::Result<()> {
    let deadline = deadline_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
    let orchestrator = build_orchestrator(config)?;
    let messages = read_event(input)?.into_messages();

    info!(
        messages = messages.len(),
        stream = %config.stream_name,
        quarantine_bucket = config.events_bucket.as_deref().unwrap_or("-"),
        "Processing batch"
    );

    let result = orchestrator.process_batch_until(&messages, deadline).await;
    let response = serde_json::to_string(&BatchItemFailures::from(&result))?;
    println!("{response}");
    Ok(())
}

/// Print the resolved configuration.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&redacted(config))?);
    Ok(())
}

fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.auth_token.is_some() {
        config.auth_token = Some(REDACTED.to_string());
    }
    config
}
