//! Core types for the SQS receiver
//!
//! This crate provides the message model and the in-memory buffer shared by the
//! background poller and the HTTP query path.

pub mod buffer;
pub mod message;
pub mod request_id;

pub use buffer::MessageBuffer;
pub use message::Message;
pub use request_id::RequestId;
