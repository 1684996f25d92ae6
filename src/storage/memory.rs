//! In-memory document store
//!
//! Used by default for local runs and throughout the test suite. Each
//! operation takes the lock only for its own duration.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::models::{
    BatchId, Campaign, CampaignId, CommunicationBatch, Customer, CustomerId, DeliveryStatus, Order,
    OrderId,
};

#[derive(Default)]
struct Collections {
    customers: HashMap<CustomerId, Customer>,
    orders: HashMap<OrderId, Order>,
    batches: HashMap<BatchId, CommunicationBatch>,
    campaigns: HashMap<CampaignId, Campaign>,
}

/// Document store backed by hash maps
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save_customer(&self, customer: &Customer) -> Result<()> {
        self.collections
            .write()
            .await
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn find_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        Ok(self.collections.read().await.customers.get(id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let mut customers: Vec<Customer> = self
            .collections
            .read()
            .await
            .customers
            .values()
            .cloned()
            .collect();
        customers.sort_by_key(|c| c.created_at);
        Ok(customers)
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        self.collections
            .write()
            .await
            .orders
            .insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn save_batch(&self, batch: &CommunicationBatch) -> Result<()> {
        self.collections
            .write()
            .await
            .batches
            .insert(batch.id.clone(), batch.clone());
        Ok(())
    }

    async fn find_batch(&self, id: &BatchId) -> Result<Option<CommunicationBatch>> {
        Ok(self.collections.read().await.batches.get(id).cloned())
    }

    async fn update_delivery_status(
        &self,
        batch: &BatchId,
        customer: &CustomerId,
        status: DeliveryStatus,
    ) -> Result<DeliveryStatus> {
        let mut collections = self.collections.write().await;

        let stored = collections
            .batches
            .get_mut(batch)
            .ok_or_else(|| Error::not_found("Communication", batch))?;

        stored
            .set_status(customer, status)
            .ok_or_else(|| Error::record_not_found(batch, customer))
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        self.collections
            .write()
            .await
            .campaigns
            .insert(campaign.id.clone(), campaign.clone());
        Ok(())
    }

    async fn find_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        Ok(self.collections.read().await.campaigns.get(id).cloned())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .collections
            .read()
            .await
            .campaigns
            .values()
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }
}
