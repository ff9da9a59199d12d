//! Error types for the Orderport core library.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering configuration, record sources, and order upload.

use std::path::PathBuf;

/// Top-level error type for the Orderport core library.
#[derive(Debug, thiserror::Error)]
pub enum OrderportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while reading raw records from a CSV file or a JSON API.
///
/// Any of these aborts the pipeline of the source that raised it; the other
/// sources still run.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} responded with HTTP {status}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid JSON from {url}: {message}")]
    InvalidJson { url: String, message: String },

    #[error("No records retrieved from {origin}")]
    NoRecords { origin: String },
}

impl SourceError {
    /// True when the source was reachable but produced nothing to import.
    pub fn is_no_records(&self) -> bool {
        matches!(self, SourceError::NoRecords { .. })
    }
}

/// Errors from submitting a single order to the platform.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Order request failed: {message}")]
    Request { message: String },

    #[error("Order rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Could not parse order response: {message}")]
    ResponseParse { message: String },

    #[error("Order '{order_name}' not submitted: {reason}")]
    DataQuality { order_name: String, reason: String },
}
