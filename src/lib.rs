//! Songplay ETL Library
//!
//! Loads song metadata and user activity logs, both newline-delimited JSON,
//! into a five-table SQLite warehouse.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod locator;
pub mod records;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use batch::{run_batch, BatchAborted, BatchOptions, BatchReport, PassReport};
pub use error::EtlError;
pub use warehouse::{TableCounts, Warehouse};
