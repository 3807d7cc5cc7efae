//! Process-wide state shared by the HTTP handlers and the poller

use std::sync::Arc;

use sqsreceiver_core::MessageBuffer;
use sqsreceiver_queue::QueueClient;

/// Constructed once at startup and handed to both ingestion paths
pub struct AppState {
    pub queue: Arc<dyn QueueClient>,
    pub buffer: Arc<MessageBuffer>,
    /// Messages requested per receive call
    pub batch_size: i32,
}

impl AppState {
    pub fn new(queue: Arc<dyn QueueClient>, batch_size: i32) -> Self {
        Self {
            queue,
            buffer: Arc::new(MessageBuffer::new()),
            batch_size,
        }
    }
}
