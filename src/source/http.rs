//! HTTP data source talking to a running proxy.
//!
//! ## Example
//!
//! ```rust,no_run
//! use imgproxy_doctor::{DataSource, HttpSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpSource::builder()
//!         .endpoint("http://localhost:8081")
//!         .build()?;
//!
//!     let text = source.fetch_metrics().await?;
//!     println!("{} bytes of metrics", text.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::rpc::{decode_response, DescribeParams, RpcMethod, RpcRequest};
use super::{BuildInfo, DataSource};
use crate::data::{DescribedDocument, RawReport};
use crate::error::{Error, Result};

/// Source that polls the proxy over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    endpoint: String,
    metrics_path: String,
    info_path: String,
    jsonrpc_version: String,
    description: String,
}

impl HttpSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn call<P, R>(&self, method: RpcMethod, params: Option<P>) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = RpcRequest::new(&self.jsonrpc_version, method, params);
        debug!("Calling {} on {}", method.wire_name(), self.endpoint);

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "{} returned status {}",
                method.wire_name(),
                response.status()
            )));
        }

        let body = response.text().await?;
        decode_response(method, &body)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_metrics(&self) -> Result<String> {
        let response = self.client.get(self.url(&self.metrics_path)).send().await?;

        if !response.status().is_success() {
            return Err(Error::EndpointUnavailable {
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn fetch_reports(&self) -> Result<Vec<RawReport>> {
        self.call::<(), _>(RpcMethod::DescribeReports, None).await
    }

    async fn fetch_documents(&self, urls: &[String]) -> Result<Vec<DescribedDocument>> {
        let params = DescribeParams {
            urls: urls.to_vec(),
        };
        self.call(RpcMethod::Describe, Some(params)).await
    }

    async fn fetch_info(&self) -> Result<BuildInfo> {
        let response = self.client.get(self.url(&self.info_path)).send().await?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "info returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for HttpSource.
#[derive(Debug, Default)]
pub struct HttpSourceBuilder {
    endpoint: Option<String>,
    metrics_path: Option<String>,
    info_path: Option<String>,
    jsonrpc_version: Option<String>,
    timeout: Option<Duration>,
}

impl HttpSourceBuilder {
    /// Set the proxy endpoint (e.g., "http://localhost:8081").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the metrics path (default: "/metrics").
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Set the build info path (default: "/info").
    pub fn info_path(mut self, path: impl Into<String>) -> Self {
        self.info_path = Some(path.into());
        self
    }

    /// Set the protocol version sent in RPC envelopes (default: "1.0.0").
    pub fn jsonrpc_version(mut self, version: impl Into<String>) -> Self {
        self.jsonrpc_version = Some(version.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the source.
    pub fn build(self) -> Result<HttpSource> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:8081".to_string())
            .trim_end_matches('/')
            .to_string();
        let description = format!("http: {}", endpoint);

        Ok(HttpSource {
            client,
            endpoint,
            metrics_path: self.metrics_path.unwrap_or_else(|| "/metrics".to_string()),
            info_path: self.info_path.unwrap_or_else(|| "/info".to_string()),
            jsonrpc_version: self.jsonrpc_version.unwrap_or_else(|| "1.0.0".to_string()),
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let source = HttpSource::builder().build().unwrap();
        assert_eq!(source.endpoint(), "http://localhost:8081");
        assert_eq!(source.metrics_path, "/metrics");
        assert_eq!(source.info_path, "/info");
        assert_eq!(source.jsonrpc_version, "1.0.0");
        assert_eq!(source.description(), "http: http://localhost:8081");
    }

    #[test]
    fn test_builder_custom() {
        let source = HttpSource::builder()
            .endpoint("http://proxy.local:9000/")
            .metrics_path("stats")
            .info_path("/version")
            .jsonrpc_version("2.0")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(source.endpoint(), "http://proxy.local:9000");
        assert_eq!(source.url(&source.metrics_path), "http://proxy.local:9000/stats");
        assert_eq!(source.url(&source.info_path), "http://proxy.local:9000/version");
        assert_eq!(source.jsonrpc_version, "2.0");
    }
}
