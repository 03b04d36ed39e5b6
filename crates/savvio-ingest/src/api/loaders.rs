//! Dataset loaders backed by the SavVio API

use super::client::ApiClient;
use crate::config::ApiConfig;
use crate::dataset::{Dataset, DatasetTarget, DatasetTargets};
use crate::error::Result;
use crate::orchestrator::{DatasetOutcome, IngestBackend};
use async_trait::async_trait;
use savvio_common::Table;
use tracing::info;

async fn load_dataset(client: &ApiClient, target: &DatasetTarget) -> Result<Table> {
    info!(
        dataset = %target.dataset,
        endpoint = %target.endpoint,
        "Loading {} from API",
        target.dataset.label()
    );

    let table = client
        .fetch_and_save(&target.endpoint, &target.local_path, &target.format().to_string(), true)
        .await?;

    info!(
        dataset = %target.dataset,
        rows = table.row_count(),
        columns = table.column_count(),
        "{} loaded successfully",
        target.dataset.label()
    );
    Ok(table)
}

/// Fetch financial records (all pages) and save them as CSV
pub async fn load_financial_data(client: &ApiClient, target: &DatasetTarget) -> Result<Table> {
    load_dataset(client, target).await
}

/// Fetch product records (all pages) and save them as a JSON array
pub async fn load_product_data(client: &ApiClient, target: &DatasetTarget) -> Result<Table> {
    load_dataset(client, target).await
}

/// Fetch product reviews (all pages) and save them as a JSON array
pub async fn load_review_data(client: &ApiClient, target: &DatasetTarget) -> Result<Table> {
    load_dataset(client, target).await
}

/// The API as an ingestion backend
pub struct ApiBackend {
    client: ApiClient,
    targets: DatasetTargets,
}

impl ApiBackend {
    pub fn new(config: ApiConfig, targets: DatasetTargets) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
            targets,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn outcome(&self, dataset: Dataset, table: Table) -> DatasetOutcome {
        DatasetOutcome::new(dataset, table, self.targets.get(dataset).local_path.clone())
    }
}

#[async_trait]
impl IngestBackend for ApiBackend {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn load_financial(&self) -> Result<DatasetOutcome> {
        let table = load_financial_data(&self.client, &self.targets.financial).await?;
        Ok(self.outcome(Dataset::Financial, table))
    }

    async fn load_product(&self) -> Result<DatasetOutcome> {
        let table = load_product_data(&self.client, &self.targets.product).await?;
        Ok(self.outcome(Dataset::Product, table))
    }

    async fn load_review(&self) -> Result<DatasetOutcome> {
        let table = load_review_data(&self.client, &self.targets.review).await?;
        Ok(self.outcome(Dataset::Review, table))
    }
}
