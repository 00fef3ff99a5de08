//! Gateway endpoint discovery
//!
//! The WebSocket endpoint is looked up once per connection attempt from
//! the service's REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use cord_common::GatewayError;

/// Looks up the WebSocket URL to connect to.
#[async_trait]
pub trait GatewayRetriever: Send + Sync {
    /// Return the gateway URL. Called once per connection attempt.
    async fn gateway(&self) -> Result<String, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    url: String,
}

/// Retrieves the gateway URL from the service's REST API.
#[derive(Debug, Clone)]
pub struct HttpGatewayRetriever {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGatewayRetriever {
    /// Default API base the retriever queries.
    pub const DEFAULT_BASE_URL: &'static str = "https://discordapp.com/api";

    /// Create a retriever against the given API base.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl GatewayRetriever for HttpGatewayRetriever {
    async fn gateway(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(format!("{}/gateway", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GatewayError::GatewayLookup(e.to_string()))?;

        let body: GatewayResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::GatewayLookup(e.to_string()))?;

        Ok(body.url)
    }
}

/// A retriever that always returns a fixed URL, bypassing the REST lookup.
#[derive(Debug, Clone)]
pub struct StaticGateway {
    url: String,
}

impl StaticGateway {
    /// Wrap a known gateway URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { url: url.into() })
    }
}

#[async_trait]
impl GatewayRetriever for StaticGateway {
    async fn gateway(&self) -> Result<String, GatewayError> {
        Ok(self.url.clone())
    }
}
