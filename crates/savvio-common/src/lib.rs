//! SavVio Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared building blocks for the SavVio data pipeline crates.
//!
//! # Overview
//!
//! - **Tables**: [`Record`] and [`Table`], the in-memory currency passed between
//!   loaders and the orchestrator
//! - **Record sink**: persisting records as CSV/JSON and reading tables back
//! - **Logging**: one place to bootstrap `tracing` for every binary
//! - **Errors**: [`CommonError`] for table and file I/O failures
//!
//! # Example
//!
//! ```no_run
//! use savvio_common::sink::{self, FileFormat};
//! use savvio_common::Table;
//!
//! fn reload(path: &str) -> savvio_common::Result<Table> {
//!     let table = sink::read_table(path, FileFormat::Csv)?;
//!     println!("{} rows x {} columns", table.row_count(), table.column_count());
//!     Ok(table)
//! }
//! ```

pub mod error;
pub mod logging;
pub mod sink;
pub mod table;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use sink::FileFormat;
pub use table::{Record, Table};
