//! Queue client trait

use async_trait::async_trait;
use thiserror::Error;

/// Upper bound SQS accepts for `MaxNumberOfMessages`
pub const MAX_BATCH_SIZE: i32 = 10;

/// Errors from queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to receive messages: {0}")]
    Receive(String),

    #[error("Failed to delete message: {0}")]
    Delete(String),

    #[error("Receipt handle is invalid: {0}")]
    ReceiptHandleInvalid(String),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

/// A message as handed out by the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: Option<String>,
    pub body: Option<String>,
    /// Token needed to delete this delivery from the queue
    pub receipt_handle: Option<String>,
}

/// The two queue operations the receiver depends on
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receive up to `max_messages` messages (clamped to `1..=MAX_BATCH_SIZE`)
    async fn receive_messages(
        &self,
        max_messages: i32,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Delete one previously received message
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError>;
}

pub(crate) fn clamp_batch_size(max_messages: i32) -> i32 {
    max_messages.clamp(1, MAX_BATCH_SIZE)
}
