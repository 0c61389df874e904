//! Logging initialization for the pipeline binaries.
//!
//! Thin wrapper over the observability crate that fixes the service name and
//! lets the log file be pointed somewhere via `STREAMHOOK_LOG_FILE`.

pub use observability::LogFormat;

const SERVICE_NAME: &str = "streamhook";

/// Initialize the logging system.
///
/// Logs go to stderr in the given format; `RUST_LOG` overrides `level`.
///
/// ```ignore
/// init_logging("info", LogFormat::Json);
/// tracing::info!("pipeline started");
/// ```
pub fn init_logging(level: &str, format: LogFormat) -> bool {
    let log_path = std::env::var("STREAMHOOK_LOG_FILE")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(std::path::PathBuf::from);

    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        format,
        log_path,
    })
}
