//! Upload driver: sequential order submission with pacing.
//!
//! Every aggregate is attempted exactly once, in order. A failed order is
//! logged and recorded in the report; it never stops the batch. The pacing
//! policy runs after every attempt, including failed and skipped ones.

use std::sync::Arc;

use crate::aggregate::OrderAggregate;
use crate::config::OrderDefaults;
use crate::error::UploadError;
use crate::http::HttpTransport;
use crate::pacing::PacingPolicy;
use crate::payload::{CreateOrderResponse, CreatedOrder, build_order_request};

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub index: usize,
    pub order_name: String,
    pub result: Result<CreatedOrder, UploadError>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-order outcomes of a batch, in attempt order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Submits order aggregates to the Shopify order-creation endpoint.
pub struct UploadDriver {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    access_token: String,
    defaults: OrderDefaults,
    pacer: Box<dyn PacingPolicy>,
    reject_invalid_quantity: bool,
}

impl UploadDriver {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        defaults: OrderDefaults,
        pacer: Box<dyn PacingPolicy>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            defaults,
            pacer,
            reject_invalid_quantity: false,
        }
    }

    /// Refuse to submit orders whose quantities did not parse.
    pub fn with_reject_invalid_quantity(mut self, reject: bool) -> Self {
        self.reject_invalid_quantity = reject;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit a single order. No pacing, no retries.
    pub async fn upload_order(&self, order: &OrderAggregate) -> Result<CreatedOrder, UploadError> {
        if self.reject_invalid_quantity && order.has_invalid_quantity() {
            return Err(UploadError::DataQuality {
                order_name: order.order_name.clone(),
                reason: "line item quantity is not an integer".into(),
            });
        }

        let request = build_order_request(order, &self.defaults);
        let body = serde_json::to_value(&request).map_err(|e| UploadError::Request {
            message: format!("Failed to encode order: {e}"),
        })?;

        let resp = self
            .transport
            .post_json(
                &self.endpoint,
                &[(ACCESS_TOKEN_HEADER, self.access_token.as_str())],
                &body,
            )
            .await
            .map_err(|message| UploadError::Request { message })?;

        if !resp.is_success() {
            return Err(UploadError::Rejected {
                status: resp.status,
                body: resp.body,
            });
        }

        serde_json::from_str::<CreateOrderResponse>(&resp.body)
            .map(|parsed| parsed.order)
            .map_err(|e| UploadError::ResponseParse {
                message: e.to_string(),
            })
    }

    /// Attempt every order once, in order, pacing after each attempt.
    pub async fn upload_all(&self, orders: &[OrderAggregate]) -> UploadReport {
        let total = orders.len();
        let mut report = UploadReport::default();

        for (index, order) in orders.iter().enumerate() {
            let position = index + 1;
            tracing::info!(order = %order.order_name, "Uploading order {position}/{total} to Shopify");

            let result = self.upload_order(order).await;
            match &result {
                Ok(created) => tracing::info!(
                    order = %order.order_name,
                    platform_id = ?created.id,
                    "Uploaded order {position}/{total} to Shopify: {}",
                    created.name
                ),
                Err(e) => tracing::error!(
                    order = %order.order_name,
                    error = %e,
                    "Failed to upload order {position}/{total}"
                ),
            }

            report.outcomes.push(UploadOutcome {
                index,
                order_name: order.order_name.clone(),
                result,
            });

            self.pacer.wait_before_next().await;
        }

        report
    }
}
