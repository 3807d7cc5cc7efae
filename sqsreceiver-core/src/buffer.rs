//! In-memory buffer of received messages
//!
//! The buffer is append-only and unbounded: entries are never evicted and live for the
//! lifetime of the process. It is shared between the background poller and the HTTP
//! handlers, so all synchronization happens inside.

use parking_lot::RwLock;
use tracing::trace;

use crate::message::Message;

/// Concurrency-safe, insertion-ordered store of every message received so far
#[derive(Debug, Default)]
pub struct MessageBuffer {
    messages: RwLock<Vec<Message>>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message to the end of the buffer
    pub fn append(&self, message: Message) {
        let mut messages = self.messages.write();
        messages.push(message);
        trace!(len = messages.len(), "Buffered message");
    }

    /// Append a batch of messages under a single write lock
    pub fn append_batch(&self, batch: impl IntoIterator<Item = Message>) {
        let mut messages = self.messages.write();
        messages.extend(batch);
        trace!(len = messages.len(), "Buffered batch");
    }

    /// Copy of the buffered messages, oldest first.
    ///
    /// With `Some(priority)` only messages whose priority equals it exactly are returned.
    pub fn snapshot(&self, priority: Option<&str>) -> Vec<Message> {
        let messages = self.messages.read();
        match priority {
            Some(p) => messages.iter().filter(|m| m.has_priority(p)).cloned().collect(),
            None => messages.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn msg(body: &str, priority: Option<&str>) -> Message {
        Message::new(Some(body.to_string()), priority.map(str::to_string))
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let buffer = MessageBuffer::new();
        for body in ["one", "two", "three", "two"] {
            buffer.append(msg(body, None));
        }

        let bodies: Vec<_> = buffer
            .snapshot(None)
            .into_iter()
            .map(|m| m.body.unwrap())
            .collect();
        assert_eq!(bodies, vec!["one", "two", "three", "two"]);
    }

    #[test]
    fn test_snapshot_filters_by_exact_priority() {
        let buffer = MessageBuffer::new();
        buffer.append(msg("a", Some("urgent")));
        buffer.append(msg("b", None));
        buffer.append(msg("c", Some("Urgent")));
        buffer.append(msg("d", Some("urgent")));

        let urgent = buffer.snapshot(Some("urgent"));
        assert_eq!(urgent, vec![msg("a", Some("urgent")), msg("d", Some("urgent"))]);
    }

    #[test]
    fn test_snapshot_no_match_is_empty() {
        let buffer = MessageBuffer::new();
        buffer.append(msg("a", Some("low")));

        assert!(buffer.snapshot(Some("high")).is_empty());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = MessageBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.snapshot(None).is_empty());
    }

    #[test]
    fn test_append_batch() {
        let buffer = MessageBuffer::new();
        buffer.append(msg("first", None));
        buffer.append_batch(vec![msg("second", None), msg("third", None)]);

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.snapshot(None)[2], msg("third", None));
    }

    #[test]
    fn test_snapshot_is_detached_from_later_appends() {
        let buffer = MessageBuffer::new();
        buffer.append(msg("a", None));
        let snapshot = buffer.snapshot(None);
        buffer.append(msg("b", None));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 250;

        let buffer = Arc::new(MessageBuffer::new());
        let tasks = (0..WRITERS).map(|w| {
            let buffer = buffer.clone();
            tokio::spawn(async move {
                for i in 0..PER_WRITER {
                    buffer.append(msg(&format!("{w}-{i}"), None));
                    if i % 50 == 0 {
                        // Interleave readers with the writers
                        let _ = buffer.snapshot(None);
                        tokio::task::yield_now().await;
                    }
                }
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        let snapshot = buffer.snapshot(None);
        assert_eq!(snapshot.len(), WRITERS * PER_WRITER);

        let unique: HashSet<_> = snapshot.into_iter().map(|m| m.body.unwrap()).collect();
        assert_eq!(unique.len(), WRITERS * PER_WRITER);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_per_writer_order_is_kept() {
        let buffer = Arc::new(MessageBuffer::new());
        let tasks = ["x", "y"].map(|prefix| {
            let buffer = buffer.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    buffer.append(msg(&format!("{prefix}{i}"), Some(prefix)));
                }
            })
        });
        for task in tasks {
            task.await.unwrap();
        }

        for prefix in ["x", "y"] {
            let bodies: Vec<_> = buffer
                .snapshot(Some(prefix))
                .into_iter()
                .map(|m| m.body.unwrap())
                .collect();
            let expected: Vec<_> = (0..100).map(|i| format!("{prefix}{i}")).collect();
            assert_eq!(bodies, expected);
        }
    }
}
