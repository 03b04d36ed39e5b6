//! Command-line interface for running ingestion by hand

use crate::config::IngestConfig;
use crate::orchestrator::{DatasetOutcome, IngestionResult, Orchestrator};
use crate::report::JsonFileReporter;
use crate::storage::ObjectStoreClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Table};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Rows shown per dataset after a run
const SAMPLE_ROWS: usize = 3;

/// SavVio raw-data ingestion
#[derive(Parser, Debug)]
#[command(name = "savvio-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load all three datasets from the configured source (default)
    Run {
        /// Write shapes and paths to this JSON file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the effective configuration (secrets omitted)
    Config,

    /// List object keys in the configured bucket
    List {
        /// Only keys starting with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Upload a local file to the configured bucket
    Upload {
        /// Local file to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Destination object key
        #[arg(short, long)]
        key: String,

        /// MIME type stored with the object
        #[arg(long)]
        content_type: Option<String>,
    },
}

pub async fn execute(command: Commands, config: IngestConfig) -> Result<()> {
    match command {
        Commands::Run { report } => run(config, report).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config.summary())?);
            Ok(())
        },
        Commands::List { prefix } => {
            let client = ObjectStoreClient::connect(&config.storage).await?;
            for key in client.list(&config.storage.bucket, prefix.as_deref()).await? {
                println!("{}", key);
            }
            Ok(())
        },
        Commands::Upload {
            file,
            key,
            content_type,
        } => {
            let client = ObjectStoreClient::connect(&config.storage).await?;
            let uri = client
                .upload(&config.storage.bucket, &file, &key, content_type.as_deref())
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            println!("{}", uri);
            Ok(())
        },
    }
}

async fn run(config: IngestConfig, report: Option<PathBuf>) -> Result<()> {
    let orchestrator = Orchestrator::new(config);
    let result = orchestrator.run().await.context("Ingestion failed")?;
    println!("{}", summary_table(&result));
    for outcome in result.outcomes() {
        if !outcome.table.is_empty() {
            println!("\n{} (first {} rows)", outcome.dataset.label(), SAMPLE_ROWS);
            println!("{}", sample_table(outcome, SAMPLE_ROWS));
        }
    }

    if let Some(path) = report {
        let mut reporter = JsonFileReporter::new(path);
        result.report_to(&mut reporter);
        let saved = reporter.save()?;
        info!(path = %saved.display(), summary = ?result.summary(), "Report written");
    }
    Ok(())
}

/// One row per dataset: rows, columns, path and column names
pub fn summary_table(result: &IngestionResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Dataset", "Rows", "Columns", "Path", "Column names"]);

    for outcome in result.outcomes() {
        table.add_row(vec![
            Cell::new(outcome.dataset.label()),
            Cell::new(outcome.table.row_count()),
            Cell::new(outcome.table.column_count()),
            Cell::new(outcome.path.display()),
            Cell::new(outcome.table.columns().join(", ")),
        ]);
    }
    table
}

/// The first `n` rows of a dataset, one column per field
pub fn sample_table(outcome: &DatasetOutcome, n: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(outcome.table.columns());

    for record in outcome.table.head(n) {
        table.add_row(outcome.table.columns().iter().map(|column| match record.get(column) {
            None | Some(Value::Null) => Cell::new(""),
            Some(Value::String(s)) => Cell::new(s),
            Some(other) => Cell::new(other),
        }));
    }
    table
}
