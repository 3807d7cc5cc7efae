//! In-memory queue with visibility-timeout semantics

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{clamp_batch_size, QueueClient, QueueError, ReceivedMessage};

/// Default visibility timeout, matching SQS
const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct StoredMessage {
    /// Send order, used to keep redeliveries in FIFO order
    seq: u64,
    message_id: String,
    body: String,
    receive_count: u32,
}

#[derive(Debug)]
struct InFlight {
    message: StoredMessage,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<StoredMessage>,
    /// receipt handle -> delivery awaiting deletion
    in_flight: HashMap<String, InFlight>,
    next_seq: u64,
}

impl QueueState {
    /// Move deliveries whose visibility timeout elapsed back onto the queue, oldest
    /// send first
    fn requeue_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, f)| f.visible_at <= now)
            .map(|(handle, _)| handle.clone())
            .collect();

        let mut requeued: Vec<StoredMessage> = expired
            .iter()
            .filter_map(|handle| self.in_flight.remove(handle))
            .map(|flight| flight.message)
            .collect();
        requeued.sort_by_key(|m| m.seq);

        self.visible.extend(requeued);
    }
}

/// Process-local [`QueueClient`].
///
/// Received messages stay in flight until deleted; undeleted deliveries become visible
/// again once the visibility timeout elapses, with a fresh receipt handle on each
/// delivery. Call counters and an outage switch make it usable as a test double.
#[derive(Debug)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
    receive_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::with_visibility_timeout(DEFAULT_VISIBILITY_TIMEOUT)
    }

    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
            receive_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Enqueue a message, returning its message ID
    pub fn send_message(&self, body: impl Into<String>) -> String {
        let mut state = self.state.lock();
        let message = StoredMessage {
            seq: state.next_seq,
            message_id: Uuid::new_v4().to_string(),
            body: body.into(),
            receive_count: 0,
        };
        state.next_seq += 1;
        let message_id = message.message_id.clone();

        state.visible.push_back(message);
        drop(state);
        info!(message_id = %message_id, "Sent message");
        message_id
    }

    /// Make every subsequent call fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Messages currently available for receive
    pub fn visible_len(&self) -> usize {
        let mut state = self.state.lock();
        state.requeue_expired(Instant::now());
        state.visible.len()
    }

    /// Messages received but neither deleted nor timed out
    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("in-memory queue is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn receive_messages(
        &self,
        max_messages: i32,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let now = Instant::now();
        let max = usize::try_from(clamp_batch_size(max_messages)).unwrap_or(1);
        let mut state = self.state.lock();
        state.requeue_expired(now);

        let mut result = Vec::new();
        while result.len() < max {
            let Some(mut message) = state.visible.pop_front() else {
                break;
            };
            message.receive_count += 1;

            let receipt_handle = Uuid::new_v4().to_string();
            result.push(ReceivedMessage {
                message_id: Some(message.message_id.clone()),
                body: Some(message.body.clone()),
                receipt_handle: Some(receipt_handle.clone()),
            });
            state.in_flight.insert(
                receipt_handle,
                InFlight {
                    message,
                    visible_at: now + self.visibility_timeout,
                },
            );
        }

        debug!(count = result.len(), "Received messages");
        Ok(result)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let removed = self.state.lock().in_flight.remove(receipt_handle);
        match removed {
            Some(flight) => {
                debug!(
                    message_id = %flight.message.message_id,
                    receive_count = flight.message.receive_count,
                    "Deleted message"
                );
                Ok(())
            }
            None => Err(QueueError::ReceiptHandleInvalid(receipt_handle.to_string())),
        }
    }
}
