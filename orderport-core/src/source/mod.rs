//! # Record Sources
//!
//! Readers that produce raw line-item records. Each source implements the
//! `RecordSource` trait so the pipeline can treat a CSV export and a JSON API
//! the same way.

pub mod api;
pub mod csv_file;

pub use api::ApiSource;
pub use csv_file::CsvFileSource;

use crate::error::SourceError;
use crate::record::RawRecord;
use async_trait::async_trait;

/// Core trait that all record sources must satisfy.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable origin, e.g. `CSV ./orders.csv`.
    fn describe(&self) -> String;

    /// Read every record, in source order.
    ///
    /// Returns `SourceError::NoRecords` rather than an empty vector.
    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError>;
}
