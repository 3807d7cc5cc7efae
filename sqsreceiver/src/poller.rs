//! Background queue poller
//!
//! Receives a batch on a fixed interval and buffers it. By default the poller only
//! observes messages: it does not delete them, so the queue redelivers them once their
//! visibility timeout expires.

use std::sync::Arc;
use std::time::Duration;

use sqsreceiver_core::Message;
use sqsreceiver_queue::QueueError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Recurring receive task
pub struct Poller {
    state: Arc<AppState>,
    interval: Duration,
    delete_messages: bool,
}

impl Poller {
    pub fn new(state: Arc<AppState>, interval: Duration) -> Self {
        Self {
            state,
            interval,
            delete_messages: false,
        }
    }

    /// Acknowledge received messages instead of leaving them on the queue
    pub fn with_delete_messages(mut self, delete_messages: bool) -> Self {
        self.delete_messages = delete_messages;
        self
    }

    /// Run the poll loop on the runtime until `shutdown` flips to `true` or its sender
    /// is dropped
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Poll loop. The first cycle runs immediately; a cycle that overruns the interval
    /// delays the next tick instead of stacking runs.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval = ?self.interval,
            batch_size = self.state.batch_size,
            delete_messages = self.delete_messages,
            "Starting poller"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped");
                        break;
                    }
                    continue;
                }
            }

            if let Err(e) = self.poll_once().await {
                error!(error = %e, "Poll cycle failed");
            }
        }

        info!("Poller stopped");
    }

    /// One receive cycle. Returns the number of messages buffered.
    pub async fn poll_once(&self) -> Result<usize, QueueError> {
        let received = self.state.queue.receive_messages(self.state.batch_size).await?;
        let count = received.len();

        for message in received {
            info!(body = ?message.body, "Received message");
            self.state.buffer.append(Message::new(message.body, None));

            if self.delete_messages {
                match message.receipt_handle.as_deref() {
                    Some(handle) => self.state.queue.delete_message(handle).await?,
                    None => warn!(
                        message_id = ?message.message_id,
                        "Missing receipt handle, not deleting"
                    ),
                }
            }
        }

        debug!(count, "Poll cycle complete");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqsreceiver_queue::{InMemoryQueue, QueueClient, ReceivedMessage};

    /// Queue that hands out a message without a receipt handle and rejects deletes
    struct NoHandleQueue;

    #[async_trait]
    impl QueueClient for NoHandleQueue {
        async fn receive_messages(
            &self,
            _max_messages: i32,
        ) -> Result<Vec<ReceivedMessage>, QueueError> {
            Ok(vec![ReceivedMessage {
                message_id: Some("m-1".to_string()),
                body: Some("orphan".to_string()),
                receipt_handle: None,
            }])
        }

        async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
            Err(QueueError::Delete(format!("unexpected delete of {receipt_handle}")))
        }
    }

    fn setup() -> (Arc<InMemoryQueue>, Arc<AppState>) {
        let queue = Arc::new(InMemoryQueue::new());
        let state = Arc::new(AppState::new(queue.clone(), 10));
        (queue, state)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    #[tokio::test]
    async fn test_poll_once_buffers_without_deleting() {
        let (queue, state) = setup();
        queue.send_message("observed");

        let poller = Poller::new(state.clone(), Duration::from_secs(1));
        assert_eq!(poller.poll_once().await.unwrap(), 1);

        assert_eq!(queue.delete_calls(), 0);
        assert_eq!(queue.in_flight_len(), 1);
        assert_eq!(
            state.buffer.snapshot(None),
            vec![Message::new(Some("observed".to_string()), None)]
        );
    }

    #[tokio::test]
    async fn test_poll_once_with_delete_policy() {
        let (queue, state) = setup();
        queue.send_message("a");
        queue.send_message("b");

        let poller = Poller::new(state, Duration::from_secs(1)).with_delete_messages(true);
        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(queue.delete_calls(), 2);
        assert_eq!(queue.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_poll_once_skips_delete_without_receipt_handle() {
        let state = Arc::new(AppState::new(Arc::new(NoHandleQueue), 10));

        // Any delete call would fail the cycle
        let poller = Poller::new(state.clone(), Duration::from_secs(1)).with_delete_messages(true);
        assert_eq!(poller.poll_once().await.unwrap(), 1);
        assert_eq!(state.buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_poll_once_respects_batch_size() {
        let queue = Arc::new(InMemoryQueue::new());
        let state = Arc::new(AppState::new(queue.clone(), 2));
        for i in 0..5 {
            queue.send_message(format!("m{i}"));
        }

        let poller = Poller::new(state.clone(), Duration::from_secs(1));
        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(state.buffer.len(), 2);
    }

    #[tokio::test]
    async fn test_poll_once_error_leaves_buffer_untouched() {
        let (queue, state) = setup();
        queue.send_message("a");
        queue.set_unavailable(true);

        let poller = Poller::new(state.clone(), Duration::from_secs(1));
        assert!(poller.poll_once().await.is_err());
        assert!(state.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_run_keeps_ticking_after_failures() {
        let (queue, state) = setup();
        queue.set_unavailable(true);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = Poller::new(state.clone(), Duration::from_millis(10)).spawn(shutdown_rx);

        wait_for(|| queue.receive_calls() >= 3).await;
        assert!(state.buffer.is_empty());

        queue.set_unavailable(false);
        queue.send_message("after outage");
        wait_for(|| state.buffer.len() == 1).await;

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let (_queue, state) = setup();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = Poller::new(state, Duration::from_secs(60)).spawn(shutdown_rx);

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_exits_immediately_if_already_shut_down() {
        let (queue, state) = setup();
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        Poller::new(state, Duration::from_millis(10)).run(shutdown_rx).await;
        assert_eq!(queue.receive_calls(), 0);
    }
}
