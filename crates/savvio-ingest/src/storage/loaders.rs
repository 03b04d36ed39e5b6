//! Dataset loaders backed by the object store

use super::client::ObjectStoreClient;
use crate::config::StorageConfig;
use crate::dataset::{Dataset, DatasetTarget, DatasetTargets};
use crate::error::Result;
use crate::orchestrator::{DatasetOutcome, IngestBackend};
use async_trait::async_trait;
use savvio_common::Table;
use tracing::info;

async fn load_dataset(client: &ObjectStoreClient, bucket: &str, target: &DatasetTarget) -> Result<Table> {
    let uri = client.uri(bucket, &target.object_key);
    info!(dataset = %target.dataset, uri = %uri, "Loading {} from object store", target.dataset.label());

    let table = client
        .load_table(bucket, &target.object_key, &target.local_path, target.format())
        .await?
        .into_table(&uri)?;

    info!(
        dataset = %target.dataset,
        rows = table.row_count(),
        columns = table.column_count(),
        "{} loaded successfully",
        target.dataset.label()
    );
    Ok(table)
}

/// Download the financial CSV and load it
pub async fn load_financial_data(client: &ObjectStoreClient, bucket: &str, target: &DatasetTarget) -> Result<Table> {
    load_dataset(client, bucket, target).await
}

/// Download the product JSON; it must be an array of records
pub async fn load_product_data(client: &ObjectStoreClient, bucket: &str, target: &DatasetTarget) -> Result<Table> {
    load_dataset(client, bucket, target).await
}

/// Download the review JSON; it must be an array of records
pub async fn load_review_data(client: &ObjectStoreClient, bucket: &str, target: &DatasetTarget) -> Result<Table> {
    load_dataset(client, bucket, target).await
}

/// The object store as an ingestion backend
pub struct ObjectStoreBackend {
    client: ObjectStoreClient,
    bucket: String,
    targets: DatasetTargets,
}

impl ObjectStoreBackend {
    pub async fn connect(config: &StorageConfig, targets: DatasetTargets) -> Result<Self> {
        let client = ObjectStoreClient::connect(config).await?;
        Ok(Self::new(client, config.bucket.clone(), targets))
    }

    pub fn new(client: ObjectStoreClient, bucket: impl Into<String>, targets: DatasetTargets) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            targets,
        }
    }

    pub fn client(&self) -> &ObjectStoreClient {
        &self.client
    }

    fn outcome(&self, dataset: Dataset, table: Table) -> DatasetOutcome {
        DatasetOutcome::new(dataset, table, self.targets.get(dataset).local_path.clone())
    }
}

#[async_trait]
impl IngestBackend for ObjectStoreBackend {
    fn name(&self) -> &'static str {
        "object-store"
    }

    async fn load_financial(&self) -> Result<DatasetOutcome> {
        let table = load_financial_data(&self.client, &self.bucket, &self.targets.financial).await?;
        Ok(self.outcome(Dataset::Financial, table))
    }

    async fn load_product(&self) -> Result<DatasetOutcome> {
        let table = load_product_data(&self.client, &self.bucket, &self.targets.product).await?;
        Ok(self.outcome(Dataset::Product, table))
    }

    async fn load_review(&self) -> Result<DatasetOutcome> {
        let table = load_review_data(&self.client, &self.bucket, &self.targets.review).await?;
        Ok(self.outcome(Dataset::Review, table))
    }
}
