//! Streamhook - delivers queued events to a streaming sink, quarantining what it cannot deliver.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use streamhook_config_and_utils::{init_logging, Config, LogFormat};

/// Streamhook command-line interface.
#[derive(Parser)]
#[command(name = "streamhook")]
#[command(about = "Deliver queued event batches to a streaming sink")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log output format on stderr (json, compact)
    #[arg(long, default_value = "json", global = true)]
    log_format: LogFormat,

    /// JSON configuration file; environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one queue event and print the partial-batch response
    Process {
        /// Queue event JSON file. Reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Stop starting new messages after this many milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
    /// Validate configuration and print it with secrets redacted
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing stream name stops the process here.
    let config = Config::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, cli.log_format);

    match cli.command {
        Commands::Process { input, deadline_ms } => {
            app::run_process(&config, input.as_deref(), deadline_ms).await?;
        }
        Commands::CheckConfig => {
            app::check_config(&config)?;
        }
    }

    Ok(())
}
