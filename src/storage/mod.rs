//! Document store abstraction
//!
//! Business logic talks to a [`DocumentStore`] trait object so the backend
//! can be swapped without touching the delivery or campaign code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │      Delivery / Campaign / Customer services                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DocumentStore                           │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                            │
//!                  ▼                            ▼
//!        ┌─────────────────┐          ┌─────────────────┐
//!        │   MemoryStore   │          │   SqliteStore   │
//!        └─────────────────┘          └─────────────────┘
//! ```
//!
//! Delivery status changes go through [`DocumentStore::update_delivery_status`],
//! which updates a single record atomically instead of rewriting the whole
//! batch, so concurrent reports for different customers of the same batch
//! never overwrite each other.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use crate::models::{
    BatchId, Campaign, CampaignId, CommunicationBatch, Customer, CustomerId, DeliveryStatus, Order,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Shared handle to a document store
pub type SharedStore = Arc<dyn DocumentStore>;

/// Customer query used by the filtered customer listing
///
/// Every field is optional; an empty filter matches all customers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    /// Case-insensitive substring of the customer name
    pub name: Option<String>,
    pub min_spend: Option<f64>,
    pub max_spend: Option<f64>,
    pub min_visits: Option<u64>,
    pub max_visits: Option<u64>,
    pub last_visit_before: Option<DateTime<Utc>>,
    pub last_visit_after: Option<DateTime<Utc>>,
}

impl CustomerFilter {
    /// Check whether a customer satisfies every set criterion
    pub fn matches(&self, customer: &Customer) -> bool {
        if let Some(name) = &self.name {
            if !customer.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if self.min_spend.is_some_and(|min| customer.total_spend < min) {
            return false;
        }
        if self.max_spend.is_some_and(|max| customer.total_spend > max) {
            return false;
        }
        if self.min_visits.is_some_and(|min| customer.total_visits < min) {
            return false;
        }
        if self.max_visits.is_some_and(|max| customer.total_visits > max) {
            return false;
        }
        if self
            .last_visit_before
            .is_some_and(|before| customer.last_visit >= before)
        {
            return false;
        }
        if self
            .last_visit_after
            .is_some_and(|after| customer.last_visit <= after)
        {
            return false;
        }
        true
    }
}

/// Persistent storage for customers, orders, batches and campaigns
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a customer
    async fn save_customer(&self, customer: &Customer) -> Result<()>;

    /// Find a customer by ID
    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>>;

    /// All customers, oldest first
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    /// Resolve a list of IDs, skipping the ones that do not exist
    async fn find_customers(&self, ids: &[CustomerId]) -> Result<Vec<Customer>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(customer) = self.find_customer(id).await? {
                found.push(customer);
            }
        }
        Ok(found)
    }

    /// Customers matching a filter
    async fn filter_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        Ok(self
            .list_customers()
            .await?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }

    /// Insert or replace an order
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Insert or replace a communication batch
    async fn save_batch(&self, batch: &CommunicationBatch) -> Result<()>;

    /// Find a communication batch by ID
    async fn find_batch(&self, id: &BatchId) -> Result<Option<CommunicationBatch>>;

    /// Atomically set the status of the first record for `customer` in a batch
    ///
    /// Returns the previous status. Fails with `NotFound` if the batch is
    /// missing and `RecordNotFound` if the customer is not part of it.
    async fn update_delivery_status(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        status: DeliveryStatus,
    ) -> Result<DeliveryStatus>;

    /// Insert or replace a campaign
    async fn save_campaign(&self, campaign: &Campaign) -> Result<()>;

    /// Find a campaign by ID
    async fn find_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>>;

    /// All campaigns, newest first
    async fn list_campaigns(&self) -> Result<Vec<Campaign>>;
}

/// Open the store selected by configuration
pub fn open(config: &StorageConfig) -> Result<SharedStore> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            if let Some(parent) = config.sqlite_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            tracing::info!(path = %config.sqlite_path.display(), "Using SQLite document store");
            Ok(Arc::new(SqliteStore::new(&config.sqlite_path)?))
        }
    }
}
