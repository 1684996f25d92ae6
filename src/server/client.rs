//! Status callback client
//!
//! Posts delivery outcomes to an outreach server's `/update-status`
//! endpoint, the way an external delivery provider reports back.
//! Requests are sent once; a failed report is left to the caller.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{BatchId, CustomerId, DeliveryOutcome};

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the status client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the outreach server
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create a new client config
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 10,
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Body of a status callback
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate<'a> {
    communication_id: &'a str,
    customer_id: &'a str,
    status: &'static str,
}

// ============================================================================
// Status Client
// ============================================================================

/// HTTP client for the status callback endpoint
pub struct StatusClient {
    config: ClientConfig,
    http_client: Client,
}

impl StatusClient {
    /// Create a new status client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Callback endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}/update-status", self.config.base_url.trim_end_matches('/'))
    }

    /// Report one delivery outcome
    pub async fn update_status(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        outcome: DeliveryOutcome,
    ) -> Result<()> {
        let body = StatusUpdate {
            communication_id: batch.as_str(),
            customer_id: customer.as_str(),
            status: outcome.as_str(),
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(Error::other(format!(
            "Status callback returned {}: {}",
            status.as_u16(),
            message
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
