//! Shared helpers for savvio-ingest integration tests
//!
//! - API settings tuned for tests (millisecond backoff, no page delay)
//! - A local object store seeded inside a temp directory
//! - Configurations wired to either of the above
//! - Log capture for asserting on emitted events

#![allow(dead_code)]

use savvio_ingest::config::{ApiConfig, IngestConfig, RetryConfig, StorageConfig};
use savvio_ingest::{DataSource, DatasetTargets};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

pub const TEST_BUCKET: &str = "savvio-test-bucket";

/// API settings pointed at a mock server, with waits shrunk to milliseconds
pub fn api_config(base_url: &str) -> ApiConfig {
    let mut config = ApiConfig::new(base_url);
    config.api_key = Some("test-key".to_string());
    config.timeout = Duration::from_secs(5);
    config.retry = RetryConfig {
        max_retries: 3,
        backoff_base: Duration::from_millis(1),
    };
    config.pagination.page_delay = Duration::ZERO;
    config
}

/// Write an object into a local store rooted at `root`
pub fn put_object(root: &Path, key: &str, contents: &str) {
    let path = root.join(TEST_BUCKET).join(key);
    std::fs::create_dir_all(path.parent().expect("object has a parent")).expect("create object dir");
    std::fs::write(path, contents).expect("write object");
}

/// Seed the three default dataset objects
pub fn seed_datasets(root: &Path) {
    put_object(
        root,
        "raw/financial_data.csv",
        "user_id,income,expenses\n1,5200,3100\n2,4100,2900\n3,6100,4000\n",
    );
    put_object(
        root,
        "raw/product_data.json",
        r#"[{"product_id": "p-1", "price": 24.99}, {"product_id": "p-2", "price": 39}]"#,
    );
    put_object(
        root,
        "raw/review_data.json",
        r#"[{"review_id": 1, "product_id": "p-1", "rating": 5}]"#,
    );
}

/// Full configuration for a run against a local object store
///
/// Raw files land under `<dir>/data`, objects live under `<dir>/store`.
pub fn local_store_config(dir: &Path) -> IngestConfig {
    let data_dir = dir.join("data");
    let mut storage = StorageConfig::local(dir.join("store"), TEST_BUCKET);
    storage.temp_dir = data_dir.join("temp");

    IngestConfig {
        environment: "test".to_string(),
        data_source: DataSource::ObjectStore,
        datasets: DatasetTargets::with_defaults(&data_dir),
        data_dir,
        storage,
        api: ApiConfig::default(),
    }
}

/// Full configuration for a run against a mock API
pub fn api_run_config(dir: &Path, base_url: &str) -> IngestConfig {
    let mut config = local_store_config(dir);
    config.data_source = DataSource::Api;
    config.api = api_config(base_url);
    config
}

/// In-memory sink for formatted log lines
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }

    /// Captured lines at `level` (e.g. "WARN")
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's log events into a buffer until the guard drops
///
/// `#[tokio::test]` runs on a current-thread runtime, so events from the
/// awaited code land here too.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let logs = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
