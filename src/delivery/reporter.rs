//! Status reporters
//!
//! A reporter carries one delivery outcome from the dispatcher to the status
//! tracker as a discrete call. The in-process reporter calls the tracker
//! directly; the HTTP reporter posts to the service's `/update-status`
//! endpoint, the way an external delivery provider would call back.

use async_trait::async_trait;

use super::tracker::StatusTracker;
use crate::error::Result;
use crate::models::{BatchId, CustomerId, DeliveryOutcome};
use crate::server::client::StatusClient;

/// Channel that reports a delivery outcome to the status tracker
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Get the reporter name
    fn name(&self) -> &str;

    /// Report the outcome for one customer of a batch
    async fn report(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        outcome: DeliveryOutcome,
    ) -> Result<()>;
}

/// Reports straight into a [`StatusTracker`]
pub struct TrackerReporter {
    tracker: StatusTracker,
}

impl TrackerReporter {
    pub fn new(tracker: StatusTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl StatusReporter for TrackerReporter {
    fn name(&self) -> &str {
        "in_process"
    }

    async fn report(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        outcome: DeliveryOutcome,
    ) -> Result<()> {
        self.tracker.record_status(batch, customer, outcome).await?;
        Ok(())
    }
}

/// Reports through the HTTP status callback
pub struct HttpStatusReporter {
    client: StatusClient,
}

impl HttpStatusReporter {
    pub fn new(client: StatusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusReporter for HttpStatusReporter {
    fn name(&self) -> &str {
        "http"
    }

    async fn report(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        outcome: DeliveryOutcome,
    ) -> Result<()> {
        self.client.update_status(batch, customer, outcome).await
    }
}
