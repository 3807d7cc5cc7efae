//! Queue client adapters for the SQS receiver
//!
//! The receiver only needs two operations from a queue:
//! - receive up to N messages
//! - delete one message by receipt handle
//!
//! [`SqsQueueClient`] talks to Amazon SQS (or any SQS-compatible endpoint such as
//! a local emulator). [`InMemoryQueue`] is a process-local queue with
//! visibility-timeout semantics, used as a test double.

pub mod client;
pub mod memory;
pub mod sqs;

pub use client::{QueueClient, QueueError, ReceivedMessage, MAX_BATCH_SIZE};
pub use memory::InMemoryQueue;
pub use sqs::{SqsClientConfig, SqsQueueClient, StaticCredentials};
