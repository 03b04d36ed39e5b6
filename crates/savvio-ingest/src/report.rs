//! Key/value reporting for the scheduler that runs ingestion

use crate::error::Result;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives named values produced by a run, e.g. `financial_shape`
pub trait Reporter: Send {
    fn report(&mut self, key: &str, value: Value);
}

/// Keeps reported values in memory, in report order
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    values: Map<String, Value>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Collects reported values and writes them as one pretty JSON object
///
/// Nothing touches the file until [`JsonFileReporter::save`] is called.
#[derive(Debug)]
pub struct JsonFileReporter {
    path: PathBuf,
    inner: MemoryReporter,
}

impl JsonFileReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: MemoryReporter::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn values(&self) -> &Map<String, Value> {
        self.inner.values()
    }

    pub fn save(&self) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self.inner.values())?;
        std::fs::write(&self.path, text)?;
        info!(path = %self.path.display(), keys = self.inner.values().len(), "Saved run report");
        Ok(self.path.clone())
    }
}

impl Reporter for JsonFileReporter {
    fn report(&mut self, key: &str, value: Value) {
        self.inner.report(key, value);
    }
}
