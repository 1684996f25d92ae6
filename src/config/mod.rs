//! Configuration management for the outreach service
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub use crate::server::config::ServerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Document store configuration
    pub storage: StorageConfig,

    /// Fan-out delivery configuration
    pub delivery: DeliveryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which document store backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("Unknown storage backend: {other}")),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend
    pub backend: StorageBackend,

    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            sqlite_path: PathBuf::from("data/outreach.db"),
        }
    }
}

/// How delivery outcomes travel back to the status tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterKind {
    /// Direct call into the status tracker
    #[default]
    InProcess,
    /// POST to the service's `/update-status` endpoint
    Http,
}

impl std::str::FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "in_process" => Ok(Self::InProcess),
            "http" => Ok(Self::Http),
            other => Err(format!("Unknown status reporter: {other}")),
        }
    }
}

/// Fan-out delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Probability that a simulated delivery succeeds
    pub success_rate: f64,

    /// Seed for reproducible simulated outcomes
    pub seed: Option<u64>,

    /// Status reporting channel
    pub reporter: ReporterKind,

    /// Base URL of the status callback (used by the HTTP reporter)
    ///
    /// Derived from the server bind address when unset.
    pub callback_url: Option<String>,

    /// Status callback timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.9,
            seed: None,
            reporter: ReporterKind::InProcess,
            callback_url: None,
            request_timeout_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("OUTREACH_BIND_ADDRESS") {
            config.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid OUTREACH_BIND_ADDRESS: {addr}"))?;
        } else if let Ok(port) = std::env::var("PORT") {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {port}"))?;
            config.server.bind_address.set_port(port);
        }

        if let Ok(backend) = std::env::var("OUTREACH_STORAGE") {
            config.storage.backend = backend
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid OUTREACH_STORAGE: {backend}"))?;
        }

        if let Ok(path) = std::env::var("OUTREACH_SQLITE_PATH") {
            config.storage.sqlite_path = path.into();
        }

        if let Ok(rate) = std::env::var("OUTREACH_SUCCESS_RATE") {
            config.delivery.success_rate = rate
                .parse()
                .with_context(|| format!("Invalid OUTREACH_SUCCESS_RATE: {rate}"))?;
        }

        if let Ok(seed) = std::env::var("OUTREACH_DELIVERY_SEED") {
            config.delivery.seed = Some(
                seed.parse()
                    .with_context(|| format!("Invalid OUTREACH_DELIVERY_SEED: {seed}"))?,
            );
        }

        if let Ok(reporter) = std::env::var("OUTREACH_REPORTER") {
            config.delivery.reporter = reporter
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid OUTREACH_REPORTER: {reporter}"))?;
        }

        if let Ok(url) = std::env::var("OUTREACH_CALLBACK_URL") {
            config.delivery.callback_url = Some(url);
        }

        if let Ok(level) = std::env::var("OUTREACH_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("OUTREACH_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        if !(0.0..=1.0).contains(&self.delivery.success_rate) {
            anyhow::bail!("success_rate must be between 0.0 and 1.0");
        }

        if self.delivery.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        let callback_url = self.callback_url();
        let parsed = url::Url::parse(&callback_url)
            .with_context(|| format!("Invalid callback_url: {callback_url}"))?;
        if self.delivery.reporter == ReporterKind::Http
            && parsed.port_or_known_default() != Some(self.server.bind_address.port())
        {
            tracing::warn!(
                callback_url = %callback_url,
                bind_address = %self.server.bind_address,
                "Status callback port differs from the server port"
            );
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Base URL the HTTP reporter posts status updates to
    ///
    /// An explicit `delivery.callback_url` wins. Otherwise the server's own
    /// bind address is used, with an unspecified IP replaced by loopback.
    pub fn callback_url(&self) -> String {
        if let Some(url) = &self.delivery.callback_url {
            return url.clone();
        }

        let bind = self.server.bind_address;
        let ip = match bind.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };
        format!("http://{}", SocketAddr::new(ip, bind.port()))
    }
}
