//! # Observability
//!
//! Logging bootstrap shared by every streamhook binary.
//!
//! ## Design Philosophy
//!
//! Pipeline crates are **log producers** only. They use the standard
//! `tracing` macros with structured fields (`message_id`, `reason`,
//! `attempt`, ...) and never decide where the output goes. The binary calls
//! [`init_with_config`] once at startup.
//!
//! ## Output
//!
//! Logs are written to stderr so that stdout stays reserved for the batch
//! result document. Two formats are available:
//!
//! - [`LogFormat::Json`]: one JSON object per line (see [`LogEntry`]),
//!   suitable for log shippers that ingest the process output.
//! - [`LogFormat::Compact`]: the human-readable `tracing-subscriber` formatter.
//!
//! An optional append-only JSONL file can be configured in addition.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "streamhook".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! });
//! tracing::info!("pipeline ready");
//! ```

mod json_layer;
mod writer;

use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{AppendFileWriter, StderrWriter};

/// Output format for the stderr sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable compact lines.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => Ok(Self::Json),
            "compact" | "text" | "pretty" => Ok(Self::Compact),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON log line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Format used on stderr.
    pub format: LogFormat,

    /// Optional JSONL file that receives a copy of every log line.
    pub log_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            format: LogFormat::Json,
            log_path: None,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Returns `false` when a global subscriber was already installed (tests
/// and embedders may call this more than once) or when the optional log
/// file cannot be opened; in the latter case stderr logging still works.
pub fn init_with_config(config: LogConfig) -> bool {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let stderr_layer = match config.format {
        LogFormat::Json => JsonLayer::new(config.service_name.clone(), StderrWriter)
            .with_filter(filter())
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed(),
    };

    let mut file_error = None;
    let file_layer = config.log_path.as_ref().and_then(|path| {
        match AppendFileWriter::open(path) {
            Ok(writer) => Some(
                JsonLayer::new(config.service_name.clone(), writer).with_filter(filter()),
            ),
            Err(err) => {
                file_error = Some(format!("{}: {}", path.display(), err));
                None
            }
        }
    });

    let installed = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if let Some(err) = file_error {
        tracing::warn!(error = %err, "log file unavailable, logging to stderr only");
        return false;
    }
    installed
}
