//! Per-source import pipeline: read → aggregate → upload.
//!
//! Each source runs to completion before the next one starts, and a source
//! failure is caught here so the remaining sources still run.

use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::{OrderAggregate, aggregate};
use crate::config::{ImportConfig, OrderDefaults, SourcesConfig};
use crate::error::{OrderportError, SourceError};
use crate::http::{HttpTransport, ReqwestTransport};
use crate::pacing::FixedDelay;
use crate::source::{ApiSource, CsvFileSource, RecordSource};
use crate::upload::{UploadDriver, UploadReport};

/// What one successful source run did.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub records: usize,
    pub orders: usize,
    pub upload: UploadReport,
}

/// Outcome of one source's pipeline.
#[derive(Debug)]
pub struct SourceRun {
    pub origin: String,
    pub result: Result<SourceSummary, SourceError>,
}

impl SourceRun {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Build the shared reqwest transport from the upload settings.
pub fn build_transport(config: &ImportConfig) -> Result<Arc<ReqwestTransport>, OrderportError> {
    let timeout = config.upload.request_timeout_secs.map(Duration::from_secs);
    Ok(Arc::new(ReqwestTransport::new(timeout)?))
}

/// The enabled sources, CSV first.
pub fn build_sources(
    sources: &SourcesConfig,
    transport: Arc<dyn HttpTransport>,
) -> Vec<Box<dyn RecordSource>> {
    let mut built: Vec<Box<dyn RecordSource>> = Vec::new();
    if sources.csv_enabled {
        built.push(Box::new(CsvFileSource::new(&sources.csv_path)));
    }
    if sources.api_enabled {
        built.push(Box::new(ApiSource::new(&sources.api_url, transport)));
    }
    built
}

/// Read a source and aggregate its records without uploading anything.
pub async fn collect_orders(
    source: &dyn RecordSource,
    defaults: &OrderDefaults,
) -> Result<(usize, Vec<OrderAggregate>), SourceError> {
    let records = source.fetch().await?;
    let count = records.len();
    Ok((count, aggregate(records, defaults)))
}

/// Runs sources through aggregation and upload.
pub struct ImportPipeline {
    defaults: OrderDefaults,
    driver: UploadDriver,
}

impl ImportPipeline {
    pub fn new(driver: UploadDriver, defaults: OrderDefaults) -> Self {
        Self { defaults, driver }
    }

    /// Validate `config` and wire the driver with the fixed-delay pacer.
    pub fn from_config(
        config: &ImportConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, OrderportError> {
        config.validate()?;
        let endpoint = config.shopify.orders_endpoint()?;
        let driver = UploadDriver::new(
            transport,
            endpoint.as_str(),
            config.shopify.access_token.as_str(),
            config.orders.clone(),
            Box::new(FixedDelay::from_millis(config.upload.pacing_interval_ms)),
        )
        .with_reject_invalid_quantity(config.upload.reject_invalid_quantity);
        Ok(Self::new(driver, config.orders.clone()))
    }

    pub fn driver(&self) -> &UploadDriver {
        &self.driver
    }

    /// Read, aggregate, and upload one source.
    pub async fn run_source(&self, source: &dyn RecordSource) -> Result<SourceSummary, SourceError> {
        let (records, orders) = collect_orders(source, &self.defaults).await?;
        tracing::info!(
            source = %source.describe(),
            records,
            orders = orders.len(),
            "Uploading {} orders",
            orders.len()
        );
        let upload = self.driver.upload_all(&orders).await;
        Ok(SourceSummary {
            records,
            orders: orders.len(),
            upload,
        })
    }

    /// Run every source in turn. A failing source is logged and skipped.
    pub async fn run_all(&self, sources: &[Box<dyn RecordSource>]) -> Vec<SourceRun> {
        let mut runs = Vec::with_capacity(sources.len());
        for source in sources {
            let origin = source.describe();
            let result = self.run_source(source.as_ref()).await;
            match &result {
                Ok(summary) => tracing::info!(
                    source = %origin,
                    uploaded = summary.upload.succeeded(),
                    failed = summary.upload.failed(),
                    "Finished order processing"
                ),
                Err(e) => tracing::error!(
                    source = %origin,
                    error = %e,
                    "Error during order processing"
                ),
            }
            runs.push(SourceRun { origin, result });
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::http::HttpResponse;
    use crate::pacing::NoDelay;
    use crate::record::RawRecord;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    struct StaticSource {
        name: &'static str,
        records: Result<Vec<RawRecord>, &'static str>,
    }

    #[async_trait]
    impl RecordSource for StaticSource {
        fn describe(&self) -> String {
            self.name.to_string()
        }

        async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
            match &self.records {
                Ok(records) if records.is_empty() => Err(SourceError::NoRecords {
                    origin: self.describe(),
                }),
                Ok(records) => Ok(records.clone()),
                Err(message) => Err(SourceError::Request {
                    url: self.name.to_string(),
                    message: message.to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct AcceptAll {
        posts: Mutex<usize>,
    }

    #[async_trait]
    impl HttpTransport for AcceptAll {
        async fn get(&self, _url: &str) -> Result<HttpResponse, String> {
            Err("not used".into())
        }
        async fn post_json(
            &self,
            _url: &str,
            _headers: &[(&str, &str)],
            _body: &Value,
        ) -> Result<HttpResponse, String> {
            let mut posts = self.posts.lock().unwrap();
            *posts += 1;
            Ok(HttpResponse::new(
                201,
                format!(r##"{{"order":{{"name":"#{}"}}}}"##, 1000 + *posts),
            ))
        }
    }

    fn record(email: &str, title: &str) -> RawRecord {
        RawRecord {
            email: email.into(),
            lineitem_title: title.into(),
            lineitem_quantity: "1".into(),
            ..Default::default()
        }
    }

    fn pipeline(transport: Arc<AcceptAll>) -> ImportPipeline {
        let driver = UploadDriver::new(
            transport,
            "http://localhost/admin/api/2023-07/orders.json",
            "token",
            OrderDefaults::default(),
            Box::new(NoDelay),
        );
        ImportPipeline::new(driver, OrderDefaults::default())
    }

    #[tokio::test]
    async fn test_failed_source_does_not_block_next() {
        let transport = Arc::new(AcceptAll::default());
        let sources: Vec<Box<dyn RecordSource>> = vec![
            Box::new(StaticSource {
                name: "CSV empty.csv",
                records: Ok(vec![]),
            }),
            Box::new(StaticSource {
                name: "API down",
                records: Err("connection refused"),
            }),
            Box::new(StaticSource {
                name: "API ok",
                records: Ok(vec![
                    record("a@x.com", "T1"),
                    record("a@x.com", "T2"),
                    record("b@y.org", "T3"),
                ]),
            }),
        ];

        let runs = pipeline(transport.clone()).run_all(&sources).await;
        assert_eq!(runs.len(), 3);
        assert!(runs[0].result.as_ref().unwrap_err().is_no_records());
        assert!(!runs[1].is_success());
        let summary = runs[2].result.as_ref().unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.orders, 2);
        assert_eq!(summary.upload.succeeded(), 2);
        assert_eq!(*transport.posts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_collect_orders_counts_records() {
        let source = StaticSource {
            name: "static",
            records: Ok(vec![record("a@x.com", "T1"), record("a@x.com", "T2")]),
        };
        let (records, orders) = collect_orders(&source, &OrderDefaults::default())
            .await
            .unwrap();
        assert_eq!(records, 2);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].line_items.len(), 2);
    }

    #[test]
    fn test_build_sources_respects_flags() {
        let transport: Arc<dyn HttpTransport> = Arc::new(AcceptAll::default());
        let mut sources = SourcesConfig::default();
        let built = build_sources(&sources, transport.clone());
        let names: Vec<String> = built.iter().map(|s| s.describe()).collect();
        assert_eq!(
            names,
            vec!["CSV ./orders.csv", "API https://example.com/api/orders"]
        );

        sources.csv_enabled = false;
        assert_eq!(build_sources(&sources, transport).len(), 1);
    }

    #[test]
    fn test_from_config_fails_fast_without_credentials() {
        let transport: Arc<dyn HttpTransport> = Arc::new(AcceptAll::default());
        let result = ImportPipeline::from_config(&ImportConfig::default(), transport);
        assert!(matches!(result, Err(OrderportError::Config(_))));
    }

    #[test]
    fn test_from_config_builds_endpoint() {
        let mut config = ImportConfig::default();
        config.shopify.store_handle = "acme".into();
        config.shopify.access_token = "token".into();
        let transport: Arc<dyn HttpTransport> = Arc::new(AcceptAll::default());
        let pipeline = ImportPipeline::from_config(&config, transport).unwrap();
        assert_eq!(
            pipeline.driver().endpoint(),
            "https://acme.myshopify.com/admin/api/2023-07/orders.json"
        );
    }
}
