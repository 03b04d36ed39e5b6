//! SavVio Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Brings the three raw SavVio datasets (financial, product, review) into
//! local files and in-memory tables, from either an object store or the
//! paginated SavVio REST API.
//!
//! # Overview
//!
//! - **Configuration**: [`IngestConfig`] read once from the environment
//! - **API**: [`api::ApiClient`] with retry, pagination and dataset loaders
//! - **Object store**: [`storage::ObjectStoreClient`] over S3 or a local directory
//! - **Orchestration**: [`Orchestrator`] picks the source and loads all datasets
//! - **Reporting**: [`report::Reporter`] receives shapes and paths for downstream tasks
//!
//! # Example
//!
//! ```no_run
//! use savvio_ingest::{IngestConfig, Orchestrator};
//!
//! # async fn example() -> savvio_ingest::Result<()> {
//! let config = IngestConfig::load()?;
//! let result = Orchestrator::new(config).run().await?;
//! println!("financial rows: {}", result.financial.table.row_count());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod storage;

// Re-export commonly used types
pub use config::{DataSource, IngestConfig};
pub use dataset::{Dataset, DatasetTarget, DatasetTargets};
pub use error::{IngestError, Result};
pub use orchestrator::{DatasetOutcome, IngestBackend, IngestionResult, Orchestrator, TaskSummary};
pub use report::{JsonFileReporter, MemoryReporter, Reporter};
