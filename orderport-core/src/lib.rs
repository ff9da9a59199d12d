//! # Orderport Core
//!
//! Core library for Orderport.
//! Reads order line items from CSV files and JSON APIs, groups them into
//! orders by customer email, and creates those orders through the Shopify
//! Admin API at a paced rate.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod http;
pub mod pacing;
pub mod payload;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod upload;

// Re-export commonly used types at the crate root.
pub use aggregate::{DataQualityIssue, LineItem, OrderAggregate, OrderAggregator, aggregate, order_identity};
pub use config::{ImportConfig, OrderDefaults, load_config};
pub use error::{ConfigError, OrderportError, SourceError, UploadError};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use pacing::{FixedDelay, NoDelay, PacingPolicy};
pub use payload::{CreateOrderRequest, CreatedOrder, build_order_request};
pub use pipeline::{ImportPipeline, SourceRun, SourceSummary, build_sources, build_transport, collect_orders};
pub use record::RawRecord;
pub use source::{ApiSource, CsvFileSource, RecordSource};
pub use upload::{UploadDriver, UploadOutcome, UploadReport};
