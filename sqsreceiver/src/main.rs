//! SQS receiver
//!
//! Polls an SQS queue in the background, buffers every received message in memory and
//! serves the buffer at `GET /api/snssqs/receive`.

use clap::Parser;
use sqsreceiver::{server, AppState, Config, Poller};
use sqsreceiver_queue::SqsQueueClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sqsreceiver")]
#[command(
    about = "Buffers messages from an SQS queue and serves them over HTTP",
    long_about = None
)]
struct Args {
    /// Configuration file (defaults to ./sqsreceiver.toml when present)
    #[arg(short, long, env = "SQSRECEIVER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SQSRECEIVER_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "SQSRECEIVER_HOST")]
    host: Option<String>,

    /// URL of the queue to read from
    #[arg(long, env = "SQSRECEIVER_QUEUE_URL")]
    queue_url: Option<String>,

    /// AWS region (falls back to the ambient region chain)
    #[arg(long, env = "SQSRECEIVER_REGION")]
    region: Option<String>,

    /// Custom SQS endpoint, e.g. http://localhost:4566
    #[arg(long, env = "SQSRECEIVER_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Disable the background poller
    #[arg(long)]
    no_poller: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SQSRECEIVER_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(queue_url) = self.queue_url {
            config.queue.queue_url = Some(queue_url);
        }
        if let Some(region) = self.region {
            config.queue.region = Some(region);
        }
        if let Some(endpoint_url) = self.endpoint_url {
            config.queue.endpoint_url = Some(endpoint_url);
        }
        if self.no_poller {
            config.poller.enabled = false;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sqsreceiver={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sqsreceiver...");

    let sqs_config = config.sqs_client_config()?;
    let queue = Arc::new(SqsQueueClient::from_config(&sqs_config).await);
    let state = Arc::new(AppState::new(queue, config.queue.batch_size));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = if config.poller.enabled {
        let poller = Poller::new(state.clone(), config.poller.interval())
            .with_delete_messages(config.poller.delete_messages);
        Some(poller.spawn(shutdown_rx))
    } else {
        info!("Background poller disabled");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    })
    .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = poller {
        handle.await?;
    }

    Ok(())
}
