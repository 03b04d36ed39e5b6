//! The three datasets and where each one lives by default

use savvio_common::FileFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Financial,
    Product,
    Review,
}

impl Dataset {
    /// Load order used by the orchestrator
    pub const ALL: [Dataset; 3] = [Dataset::Financial, Dataset::Product, Dataset::Review];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Financial => "financial",
            Dataset::Product => "product",
            Dataset::Review => "review",
        }
    }

    /// Financial data is tabular CSV; products and reviews are JSON records
    pub fn format(self) -> FileFormat {
        match self {
            Dataset::Financial => FileFormat::Csv,
            Dataset::Product | Dataset::Review => FileFormat::Json,
        }
    }

    pub fn default_object_key(self) -> &'static str {
        match self {
            Dataset::Financial => "raw/financial_data.csv",
            Dataset::Product => "raw/product_data.json",
            Dataset::Review => "raw/review_data.json",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            Dataset::Financial => "/financial",
            Dataset::Product => "/products",
            Dataset::Review => "/reviews",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}_data.{}", self.name(), self.format().extension())
    }

    /// `<data_dir>/raw/<name>_data.<ext>`
    pub fn default_local_path(self, data_dir: &Path) -> PathBuf {
        data_dir.join("raw").join(self.file_name())
    }

    /// Human label used in log banners
    pub fn label(self) -> &'static str {
        match self {
            Dataset::Financial => "Financial Data",
            Dataset::Product => "Product Data",
            Dataset::Review => "Product Review Data",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Remote and local locations of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTarget {
    pub dataset: Dataset,
    /// Object key in the bucket
    pub object_key: String,
    /// Endpoint path under the API base URL
    pub endpoint: String,
    /// Where the raw file is written locally
    pub local_path: PathBuf,
}

impl DatasetTarget {
    pub fn with_defaults(dataset: Dataset, data_dir: &Path) -> Self {
        Self {
            dataset,
            object_key: dataset.default_object_key().to_string(),
            endpoint: dataset.default_endpoint().to_string(),
            local_path: dataset.default_local_path(data_dir),
        }
    }

    pub fn format(&self) -> FileFormat {
        self.dataset.format()
    }
}

/// Targets for all three datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTargets {
    pub financial: DatasetTarget,
    pub product: DatasetTarget,
    pub review: DatasetTarget,
}

impl DatasetTargets {
    pub fn with_defaults(data_dir: &Path) -> Self {
        Self {
            financial: DatasetTarget::with_defaults(Dataset::Financial, data_dir),
            product: DatasetTarget::with_defaults(Dataset::Product, data_dir),
            review: DatasetTarget::with_defaults(Dataset::Review, data_dir),
        }
    }

    pub fn get(&self, dataset: Dataset) -> &DatasetTarget {
        match dataset {
            Dataset::Financial => &self.financial,
            Dataset::Product => &self.product,
            Dataset::Review => &self.review,
        }
    }

    pub fn get_mut(&mut self, dataset: Dataset) -> &mut DatasetTarget {
        match dataset {
            Dataset::Financial => &mut self.financial,
            Dataset::Product => &mut self.product,
            Dataset::Review => &mut self.review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locations() {
        let targets = DatasetTargets::with_defaults(Path::new("data"));

        assert_eq!(targets.financial.object_key, "raw/financial_data.csv");
        assert_eq!(targets.financial.endpoint, "/financial");
        assert_eq!(targets.financial.local_path, PathBuf::from("data/raw/financial_data.csv"));
        assert_eq!(targets.financial.format(), FileFormat::Csv);

        assert_eq!(targets.product.endpoint, "/products");
        assert_eq!(targets.product.local_path, PathBuf::from("data/raw/product_data.json"));
        assert_eq!(targets.review.endpoint, "/reviews");
        assert_eq!(targets.review.format(), FileFormat::Json);
    }

    #[test]
    fn test_load_order() {
        let names: Vec<_> = Dataset::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(names, ["financial", "product", "review"]);
    }
}
