//! Test utilities for the SQS receiver
//!
//! Provides utilities for integration testing:
//! - Start/stop the receiver in-process on a random port, backed by an in-memory queue
//! - Optionally run the background poller alongside the HTTP server
//! - A client for the receive and health endpoints
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sqsreceiver_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_receive() {
//!     let server = TestServer::start().await.unwrap();
//!     server.queue().send_message("hello");
//!
//!     let messages = server.client().receive(None).await.unwrap();
//!     assert_eq!(messages.len(), 1);
//! }
//! ```

pub mod client;
pub mod server;

pub use client::{ClientError, ReceiverClient};
pub use server::{TestError, TestServer, TestServerBuilder};

/// Timeout for waiting on the server
pub const STARTUP_TIMEOUT_SECS: u64 = 5;

/// Install a test-friendly tracing subscriber; safe to call more than once
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqsreceiver=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
