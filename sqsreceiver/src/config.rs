//! Configuration management

use anyhow::{bail, Context};
use serde::Deserialize;
use sqsreceiver_queue::{SqsClientConfig, StaticCredentials};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            queue: QueueConfig::default(),
            poller: PollerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueConfig {
    pub queue_url: Option<String>,

    pub region: Option<String>,

    pub endpoint_url: Option<String>,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    #[serde(default = "default_batch_size")]
    pub batch_size: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_url: None,
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Acknowledge (delete) messages the poller receives
    #[serde(default)]
    pub delete_messages: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_interval_ms(),
            delete_messages: false,
        }
    }
}

impl PollerConfig {
    /// Poll period, never shorter than one millisecond
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_batch_size() -> i32 {
    10
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Without an explicit path an optional `sqsreceiver.{toml,yaml,json}` in the working
    /// directory is read. Environment variables use the `SQSRECEIVER__` prefix with `__`
    /// between levels, e.g. `SQSRECEIVER__QUEUE__QUEUE_URL`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("sqsreceiver").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SQSRECEIVER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        Ok(config.try_deserialize::<Config>()?)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }

    /// Settings for the SQS adapter. Fails when no queue URL is configured or when only
    /// half of a static key pair is present.
    pub fn sqs_client_config(&self) -> anyhow::Result<SqsClientConfig> {
        let Some(queue_url) = self.queue.queue_url.clone().filter(|u| !u.is_empty()) else {
            bail!("queue.queue_url is required (set SQSRECEIVER__QUEUE__QUEUE_URL or --queue-url)");
        };

        let credentials = match (&self.queue.access_key_id, &self.queue.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            }),
            (None, None) => None,
            _ => bail!("queue.access_key_id and queue.secret_access_key must be set together"),
        };

        Ok(SqsClientConfig {
            queue_url,
            region: self.queue.region.clone(),
            endpoint_url: self.queue.endpoint_url.clone(),
            credentials,
        })
    }
}
