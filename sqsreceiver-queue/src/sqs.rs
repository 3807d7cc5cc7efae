//! Amazon SQS adapter

use std::fmt;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    Client,
};
use tracing::{debug, info};

use crate::client::{clamp_batch_size, QueueClient, QueueError, ReceivedMessage};

/// Static access key pair. When absent the ambient credential chain is used.
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Settings needed to build an SQS client for one queue
#[derive(Debug, Clone)]
pub struct SqsClientConfig {
    pub queue_url: String,
    pub region: Option<String>,
    /// Override endpoint, e.g. `http://localhost:4566` for a local emulator
    pub endpoint_url: Option<String>,
    pub credentials: Option<StaticCredentials>,
}

/// [`QueueClient`] backed by `aws-sdk-sqs`
#[derive(Debug, Clone)]
pub struct SqsQueueClient {
    client: Client,
    queue_url: String,
}

impl SqsQueueClient {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build the SDK client from configuration
    pub async fn from_config(config: &SqsClientConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                None,
                None,
                "sqsreceiver-config",
            ));
        }

        let sdk_config = loader.load().await;
        info!(
            queue_url = %config.queue_url,
            region = ?sdk_config.region(),
            static_credentials = config.credentials.is_some(),
            "Initialized SQS client"
        );

        Self::new(Client::new(&sdk_config), config.queue_url.clone())
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive_messages(
        &self,
        max_messages: i32,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(clamp_batch_size(max_messages))
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;

        let messages: Vec<ReceivedMessage> = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| ReceivedMessage {
                message_id: m.message_id,
                body: m.body,
                receipt_handle: m.receipt_handle,
            })
            .collect();

        debug!(queue_url = %self.queue_url, count = messages.len(), "Received messages");
        Ok(messages)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(&e).to_string()))?;

        debug!(queue_url = %self.queue_url, "Deleted message");
        Ok(())
    }
}
