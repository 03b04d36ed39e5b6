//! SavVio Ingest - load raw datasets from object storage or the data API

use clap::Parser;
use savvio_common::logging::{init_logging, LogConfig, LogLevel};
use savvio_ingest::cli::{execute, Cli, Commands};
use savvio_ingest::IngestConfig;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("savvio-ingest")
        .build()
        .merge_env();

    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let result: anyhow::Result<()> = async {
        let config = IngestConfig::load()?;
        execute(cli.command.unwrap_or(Commands::Run { report: None }), config).await
    }
    .await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:?}", e);
        process::exit(1);
    }
}
