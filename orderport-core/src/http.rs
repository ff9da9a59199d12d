//! HTTP transport used by the API source and the upload driver.
//!
//! Real requests go through reqwest. In tests, the `HttpTransport` trait
//! allows mocking.

use async_trait::async_trait;
use std::time::Duration;

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP interactions, allowing test mocking.
///
/// `Err` means no response was received at all (connection, TLS, timeout);
/// non-2xx responses are returned as `Ok` for the caller to interpret.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, String>;

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, String>;
}

/// Real HTTP transport using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl ReqwestTransport {
    /// Build a transport; `timeout` bounds each whole request when set.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        Self::from_builder(reqwest::Client::builder(), timeout)
    }

    /// Like [`ReqwestTransport::new`], but ignores any system proxy settings.
    /// Used for endpoints on the local machine.
    pub fn direct(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        Self::from_builder(reqwest::Client::builder().no_proxy(), timeout)
    }

    fn from_builder(
        mut builder: reqwest::ClientBuilder,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn read(resp: reqwest::Response) -> Result<HttpResponse, String> {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {e}"))?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, String> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "GET request failed");
                format!("HTTP request failed: {e}")
            })?;
        Self::read(resp).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, String> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let resp = request.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "POST request failed");
            format!("HTTP request failed: {e}")
        })?;
        Self::read(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "{}").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(422, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn test_transport_with_timeout_builds() {
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5))).is_ok());
        assert!(ReqwestTransport::new(None).is_ok());
        assert!(ReqwestTransport::direct(None).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = ReqwestTransport::direct(Some(Duration::from_secs(2))).unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections.
        let result = transport.get("http://127.0.0.1:9/orders").await;
        assert!(result.is_err());
    }
}
