//! SQS receiver
//!
//! Reads messages from one SQS queue through two independent paths and keeps every
//! message in an in-memory buffer:
//! - a background [`poller::Poller`] that receives on a fixed interval
//! - `GET /api/snssqs/receive`, which receives a batch, deletes it from the queue and
//!   returns the buffer, optionally filtered by `priorityFilter`

pub mod config;
pub mod handlers;
pub mod poller;
pub mod router;
pub mod server;
pub mod service;
pub mod state;

pub use config::Config;
pub use poller::Poller;
pub use router::create_router;
pub use state::AppState;
