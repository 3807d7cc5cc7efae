//! In-process test server

use sqsreceiver::{server, AppState, Poller};
use sqsreceiver_core::MessageBuffer;
use sqsreceiver_queue::InMemoryQueue;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::STARTUP_TIMEOUT_SECS;

/// Errors that can occur with the test server
#[derive(Debug, Error)]
pub enum TestError {
    #[error("Failed to start server: {0}")]
    StartFailed(String),

    #[error("Server startup timed out")]
    StartupTimeout,

    #[error("Server task failed: {0}")]
    ServerTask(String),
}

/// Configures a [`TestServer`] before it starts
pub struct TestServerBuilder {
    queue: Arc<InMemoryQueue>,
    batch_size: i32,
    poll_interval: Option<Duration>,
    poller_deletes: bool,
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self {
            queue: Arc::new(InMemoryQueue::new()),
            batch_size: 10,
            poll_interval: None,
            poller_deletes: false,
        }
    }
}

impl TestServerBuilder {
    /// Use a pre-built queue (e.g. one with a short visibility timeout)
    pub fn queue(mut self, queue: Arc<InMemoryQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Run the background poller at this interval
    pub fn with_poller(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn poller_deletes(mut self, delete: bool) -> Self {
        self.poller_deletes = delete;
        self
    }

    pub async fn start(self) -> Result<TestServer, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| TestError::StartFailed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| TestError::StartFailed(e.to_string()))?
            .port();

        info!(port = port, "Starting test server");

        let state = Arc::new(AppState::new(self.queue.clone(), self.batch_size));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let poller = self.poll_interval.map(|interval| {
            Poller::new(state.clone(), interval)
                .with_delete_messages(self.poller_deletes)
                .spawn(shutdown_rx.clone())
        });

        let mut server_shutdown = shutdown_rx;
        let server_state = state.clone();
        let server = tokio::spawn(async move {
            server::serve(listener, server_state, async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
        });

        let base_url = format!("http://127.0.0.1:{}", port);
        let test_server = TestServer {
            queue: self.queue,
            state,
            base_url,
            port,
            shutdown_tx,
            server: Some(server),
            poller,
        };
        test_server.wait_ready().await?;
        Ok(test_server)
    }
}

/// A running receiver bound to a random local port
pub struct TestServer {
    queue: Arc<InMemoryQueue>,
    state: Arc<AppState>,
    base_url: String,
    port: u16,
    shutdown_tx: watch::Sender<bool>,
    server: Option<JoinHandle<std::io::Result<()>>>,
    poller: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server without the background poller
    pub async fn start() -> Result<Self, TestError> {
        Self::builder().start().await
    }

    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    async fn wait_ready(&self) -> Result<(), TestError> {
        let client = self.client();
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_secs(STARTUP_TIMEOUT_SECS) {
            if client.health().await.is_ok() {
                info!(port = self.port, "Test server ready");
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Err(TestError::StartupTimeout)
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The queue the server reads from
    pub fn queue(&self) -> &InMemoryQueue {
        &self.queue
    }

    /// The server's message buffer
    pub fn buffer(&self) -> &MessageBuffer {
        &self.state.buffer
    }

    /// Get a client for the server
    pub fn client(&self) -> crate::ReceiverClient {
        crate::ReceiverClient::new(self.base_url.clone())
    }

    /// Stop the poller and the HTTP server and wait for both
    pub async fn stop(&mut self) -> Result<(), TestError> {
        info!("Stopping test server");
        let _ = self.shutdown_tx.send(true);

        if let Some(poller) = self.poller.take() {
            poller
                .await
                .map_err(|e| TestError::ServerTask(e.to_string()))?;
        }
        if let Some(server) = self.server.take() {
            server
                .await
                .map_err(|e| TestError::ServerTask(e.to_string()))?
                .map_err(|e| TestError::ServerTask(e.to_string()))?;
        }

        info!("Test server stopped");
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(server) = &self.server {
            server.abort();
        }
        if let Some(poller) = &self.poller {
            poller.abort();
        }
    }
}
