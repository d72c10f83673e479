//! HTTP client for twinfed
//!
//! Mirrors [`TwinClient`](super::rpc::TwinClient) over the server's JSON API.
//!
//! # Example
//!
//! ```ignore
//! use twinfed_client::TwinHttpClient;
//!
//! let client = TwinHttpClient::new("http://localhost:8080")?;
//! let response = client.spaces("House", "2025-06-15", "2025-06-16").await?;
//! ```

use twinfed_server::Health;
use twinfed_types::query::{ErrorBody, QueryResponse, SpaceQuery};

/// HTTP client for the twinfed server
#[derive(Clone)]
pub struct TwinHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl TwinHttpClient {
    /// Create a client for `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> Result<Self, HttpClientError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HttpClientError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn spaces(
        &self,
        space: &str,
        start: &str,
        end: &str,
    ) -> Result<QueryResponse, HttpClientError> {
        self.query(&SpaceQuery::new(space, start, end)).await
    }

    pub async fn query(&self, query: &SpaceQuery) -> Result<QueryResponse, HttpClientError> {
        let response = self
            .client
            .post(format!("{}/v1/spaces", self.base_url))
            .json(query)
            .send()
            .await
            .map_err(|e| HttpClientError::Request(e.to_string()))?;

        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| HttpClientError::Response(e.to_string()));
        }

        let status = response.status().as_u16();
        match response.json::<ErrorBody>().await {
            Ok(body) => Err(HttpClientError::Server(body)),
            Err(_) => Err(HttpClientError::Server(ErrorBody {
                error: format!("HTTP {}", status),
                status,
            })),
        }
    }

    pub async fn health(&self) -> Result<Health, HttpClientError> {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| HttpClientError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| HttpClientError::Response(e.to_string()))
    }
}

/// Error type for HTTP client operations
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("Invalid response: {0}")]
    Response(String),
    #[error("Server error: {0}")]
    Server(ErrorBody),
}
