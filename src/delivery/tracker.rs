//! Delivery status tracker
//!
//! The only writer of `DeliveryRecord::status`. Each call updates one record
//! through the store's per-record operation; the last write wins.

use crate::error::Result;
use crate::metrics;
use crate::models::{BatchId, CustomerId, DeliveryOutcome, DeliveryStatus};
use crate::storage::SharedStore;

/// Status change applied to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: DeliveryStatus,
    pub current: DeliveryStatus,
}

impl StatusChange {
    /// Whether the change followed the regular `PENDING -> SENT|FAILED` path
    pub fn is_regular(&self) -> bool {
        self.previous.can_transition_to(self.current)
    }
}

/// Applies per-customer delivery outcomes to communication batches
#[derive(Clone)]
pub struct StatusTracker {
    store: SharedStore,
}

impl StatusTracker {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Set the status of `customer`'s record in `batch` to `outcome`
    ///
    /// Fails with `NotFound` if the batch does not exist and `RecordNotFound`
    /// if the customer is not part of it.
    pub async fn record_status(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        outcome: DeliveryOutcome,
    ) -> Result<StatusChange> {
        let current = DeliveryStatus::from(outcome);
        let previous = self
            .store
            .update_delivery_status(batch, customer, current)
            .await?;

        let change = StatusChange { previous, current };
        if !change.is_regular() {
            tracing::debug!(
                batch_id = %batch,
                customer_id = %customer,
                previous = %previous,
                current = %current,
                "Overwriting delivery status"
            );
        }

        metrics::record_status_update(current.as_str());
        Ok(change)
    }
}
