//! Audience aggregator
//!
//! Summarizes a batch's delivery statuses by scanning its records on every
//! call. Nothing is cached.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{BatchId, DeliveryRecord, DeliveryStatus};
use crate::storage::SharedStore;

/// Delivery counts for one audience
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AudienceSummary {
    pub size: usize,
    pub sent: usize,
    pub failed: usize,
    pub pending: usize,
}

impl AudienceSummary {
    /// Count statuses of a record list
    pub fn from_records(records: &[DeliveryRecord]) -> Self {
        records.iter().fold(
            Self {
                size: records.len(),
                ..Self::default()
            },
            |mut summary, record| {
                match record.status {
                    DeliveryStatus::Pending => summary.pending += 1,
                    DeliveryStatus::Sent => summary.sent += 1,
                    DeliveryStatus::Failed => summary.failed += 1,
                }
                summary
            },
        )
    }

    /// Whether every record has an outcome
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    /// Share of delivered records among those with an outcome (0.0 - 1.0)
    pub fn delivery_rate(&self) -> f64 {
        let settled = self.sent + self.failed;
        if settled == 0 {
            return 0.0;
        }
        self.sent as f64 / settled as f64
    }

    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Audience Summary\n\
             {:-<30}\n\
             Audience Size: {}\n\
             - Sent: {}\n\
             - Failed: {}\n\
             - Pending: {}\n\
             Delivery Rate: {:.1}%",
            "",
            self.size,
            self.sent,
            self.failed,
            self.pending,
            self.delivery_rate() * 100.0
        )
    }
}

/// Reads batches and summarizes their delivery statuses
#[derive(Clone)]
pub struct AudienceAggregator {
    store: SharedStore,
}

impl AudienceAggregator {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Summarize the latest persisted state of a batch
    pub async fn summarize(&self, batch: &BatchId) -> Result<AudienceSummary> {
        let batch = self
            .store
            .find_batch(batch)
            .await?
            .ok_or_else(|| Error::not_found("Communication", batch))?;

        Ok(AudienceSummary::from_records(&batch.records))
    }
}
