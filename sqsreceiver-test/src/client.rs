//! Client for the receiver's HTTP API

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sqsreceiver_core::Message;
use thiserror::Error;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(StatusCode),
}

/// Body of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub buffered: usize,
}

/// Client for interacting with a running receiver
pub struct ReceiverClient {
    base_url: String,
    client: Client,
}

impl ReceiverClient {
    /// Create a new client
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { base_url, client }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call the receive endpoint, optionally with a priority filter
    pub async fn receive(
        &self,
        priority_filter: Option<&str>,
    ) -> Result<Vec<Message>, ClientError> {
        let response = self.receive_raw(priority_filter).await?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Call the receive endpoint and hand back the raw response
    pub async fn receive_raw(
        &self,
        priority_filter: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}/api/snssqs/receive", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(priority) = priority_filter {
            request = request.query(&[("priorityFilter", priority)]);
        }
        Ok(request.send().await?)
    }

    /// Fetch the health document
    pub async fn health(&self) -> Result<Health, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}
