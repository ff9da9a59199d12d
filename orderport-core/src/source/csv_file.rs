//! CSV file source.
//!
//! The header row names the fields; it must use the exact `RawRecord` field
//! names. Whitespace around headers and cells is trimmed. Rows shorter than
//! the header leave the trailing fields empty.

use super::RecordSource;
use crate::error::SourceError;
use crate::record::RawRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads raw records from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("CSV {}", self.path().display())
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::FileNotFound {
                    path: self.path.clone(),
                }
            } else {
                SourceError::Csv {
                    path: self.path.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let records = parse_csv(&bytes).map_err(|e| SourceError::Csv {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if records.is_empty() {
            return Err(SourceError::NoRecords {
                origin: self.describe(),
            });
        }

        tracing::info!(
            path = %self.path.display(),
            count = records.len(),
            "Read {} records from CSV",
            records.len()
        );
        Ok(records)
    }
}

/// Parse CSV bytes with a header row into raw records.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(RawRecord::from_fields(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, value)| (name.as_str(), Some(value.to_string()))),
        ));
    }
    Ok(records)
}
