//! JSON API source.
//!
//! Issues a single GET and expects a JSON array of objects keyed by the
//! `RawRecord` field names.

use super::RecordSource;
use crate::error::SourceError;
use crate::http::HttpTransport;
use crate::record::RawRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Reads raw records from a third-party HTTP API.
pub struct ApiSource {
    url: String,
    transport: Arc<dyn HttpTransport>,
}

impl ApiSource {
    pub fn new(url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn no_records(&self) -> SourceError {
        SourceError::NoRecords {
            origin: self.describe(),
        }
    }

    fn parse_body(&self, body: &str) -> Result<Vec<RawRecord>, SourceError> {
        if body.trim().is_empty() {
            return Err(self.no_records());
        }
        let value: Value = serde_json::from_str(body).map_err(|e| SourceError::InvalidJson {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        let Value::Array(items) = value else {
            return Err(self.no_records());
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item.as_object() {
                Some(object) => records.push(RawRecord::from_json_object(object)),
                None => {
                    tracing::warn!(url = %self.url, index, "Skipping non-object API record");
                }
            }
        }

        if records.is_empty() {
            return Err(self.no_records());
        }
        Ok(records)
    }
}

#[async_trait]
impl RecordSource for ApiSource {
    fn describe(&self) -> String {
        format!("API {}", self.url())
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let resp = self
            .transport
            .get(&self.url)
            .await
            .map_err(|message| SourceError::Request {
                url: self.url.clone(),
                message,
            })?;

        if !resp.is_success() {
            return Err(SourceError::HttpStatus {
                url: self.url.clone(),
                status: resp.status,
                body: resp.body,
            });
        }

        let records = self.parse_body(&resp.body)?;
        tracing::info!(
            url = %self.url,
            count = records.len(),
            "Retrieved {} records from API",
            records.len()
        );
        Ok(records)
    }
}
