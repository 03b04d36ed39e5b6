//! Ingestion orchestrator
//!
//! Picks the backend for the configured data source and loads the financial,
//! product and review datasets one after another. The run is all-or-nothing:
//! the first failing load aborts it and no partial result is returned.

use crate::api::ApiBackend;
use crate::config::{DataSource, IngestConfig};
use crate::dataset::Dataset;
use crate::error::{IngestError, Result};
use crate::report::Reporter;
use crate::storage::ObjectStoreBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use savvio_common::Table;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// One loaded dataset and where its raw file was written
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOutcome {
    pub dataset: Dataset,
    pub table: Table,
    pub path: PathBuf,
}

impl DatasetOutcome {
    pub fn new(dataset: Dataset, table: Table, path: PathBuf) -> Self {
        Self { dataset, table, path }
    }

    pub fn records(&self) -> usize {
        self.table.row_count()
    }
}

/// A source of the three datasets
#[async_trait]
pub trait IngestBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load_financial(&self) -> Result<DatasetOutcome>;

    async fn load_product(&self) -> Result<DatasetOutcome>;

    async fn load_review(&self) -> Result<DatasetOutcome>;
}

/// The three datasets of a successful run
#[derive(Debug, Clone)]
pub struct IngestionResult {
    pub source: String,
    pub financial: DatasetOutcome,
    pub product: DatasetOutcome,
    pub review: DatasetOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionResult {
    /// Outcomes in load order
    pub fn outcomes(&self) -> [&DatasetOutcome; 3] {
        [&self.financial, &self.product, &self.review]
    }

    /// Push `<name>_shape` and `<name>_path` for every dataset
    pub fn report_to(&self, reporter: &mut dyn Reporter) {
        for outcome in self.outcomes() {
            let (rows, cols) = outcome.table.shape();
            let name = outcome.dataset.name();
            reporter.report(&format!("{}_shape", name), json!([rows, cols]));
        }
        for outcome in self.outcomes() {
            reporter.report(
                &format!("{}_path", outcome.dataset.name()),
                json!(outcome.path.display().to_string()),
            );
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            financial_records: self.financial.records(),
            product_records: self.product.records(),
            review_records: self.review.records(),
            status: "success".to_string(),
        }
    }
}

/// What a scheduler task returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub financial_records: usize,
    pub product_records: usize,
    pub review_records: usize,
    pub status: String,
}

pub struct Orchestrator {
    config: IngestConfig,
}

impl Orchestrator {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Construct the backend for the configured source
    pub async fn backend(&self) -> Result<Box<dyn IngestBackend>> {
        let targets = self.config.datasets.clone();
        match &self.config.data_source {
            DataSource::ObjectStore => Ok(Box::new(
                ObjectStoreBackend::connect(&self.config.storage, targets).await?,
            )),
            DataSource::Api => Ok(Box::new(ApiBackend::new(self.config.api.clone(), targets)?)),
            DataSource::Unsupported(name) => Err(IngestError::UnsupportedSource(name.clone())),
        }
    }

    /// Load all three datasets from the configured source
    pub async fn run(&self) -> Result<IngestionResult> {
        info!(environment = %self.config.environment, "SAVVIO DATA INGESTION");
        for (key, value) in self.config.summary() {
            info!("  {}: {}", key, value);
        }
        info!(data_source = %self.config.data_source, "Routing ingestion");

        let result = match self.backend().await {
            Ok(backend) => self.run_with(backend.as_ref()).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            error!(error = %e, "DATA INGESTION FAILED");
        }
        result
    }

    /// Load all three datasets from `backend`
    pub async fn run_with(&self, backend: &dyn IngestBackend) -> Result<IngestionResult> {
        let started_at = Utc::now();
        info!(backend = backend.name(), "DATA SOURCE: {}", backend.name());

        let loaded = async {
            let financial = backend.load_financial().await?;
            let product = backend.load_product().await?;
            let review = backend.load_review().await?;
            Ok::<_, IngestError>((financial, product, review))
        }
        .await;

        let (financial, product, review) = match loaded {
            Ok(outcomes) => outcomes,
            Err(e) => {
                error!(backend = backend.name(), error = %e, "Failed to load data");
                return Err(e);
            },
        };

        let result = IngestionResult {
            source: backend.name().to_string(),
            financial,
            product,
            review,
            started_at,
            finished_at: Utc::now(),
        };

        for outcome in result.outcomes() {
            if outcome.table.is_empty() {
                warn!(dataset = %outcome.dataset, "{} is empty!", outcome.dataset.label());
            }
        }

        info!(
            financial_records = result.financial.records(),
            product_records = result.product.records(),
            review_records = result.review.records(),
            elapsed_ms = (result.finished_at - result.started_at).num_milliseconds(),
            "DATA INGESTION SUCCESSFUL"
        );
        Ok(result)
    }

    /// Scheduler entry point: run, report shapes and paths, summarize
    ///
    /// Nothing is reported when the run fails.
    pub async fn run_task(&self, reporter: &mut dyn Reporter) -> Result<TaskSummary> {
        let result = self.run().await?;
        Ok(Self::finish_task(&result, reporter))
    }

    /// [`Orchestrator::run_task`] against a caller-supplied backend
    pub async fn run_task_with(
        &self,
        backend: &dyn IngestBackend,
        reporter: &mut dyn Reporter,
    ) -> Result<TaskSummary> {
        let result = self.run_with(backend).await?;
        Ok(Self::finish_task(&result, reporter))
    }

    fn finish_task(result: &IngestionResult, reporter: &mut dyn Reporter) -> TaskSummary {
        result.report_to(reporter);
        info!("Data paths reported for downstream tasks");
        result.summary()
    }
}
