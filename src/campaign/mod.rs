//! Campaign composition
//!
//! A campaign names at most one audience batch. Reading a campaign joins it with the
//! batch and that batch's delivery counts.

use serde::{Deserialize, Serialize};

use crate::delivery::AudienceSummary;
use crate::error::{Error, Result};
use crate::models::{BatchId, Campaign, CampaignId, CommunicationBatch};
use crate::storage::SharedStore;

/// Request body for creating a campaign
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub audience: Option<BatchId>,
}

/// Campaign joined with its audience and delivery counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    pub campaign: Campaign,
    pub audience: CommunicationBatch,
    pub audience_size: usize,
    pub sent_details: usize,
    pub failed_details: usize,
}

impl CampaignView {
    fn compose(campaign: Campaign, audience: CommunicationBatch) -> Self {
        // Counted from the same snapshot that is returned.
        let summary = AudienceSummary::from_records(&audience.records);
        Self {
            campaign,
            audience,
            audience_size: summary.size,
            sent_details: summary.sent,
            failed_details: summary.failed,
        }
    }

    /// Records still waiting for an outcome
    pub fn pending(&self) -> usize {
        self.audience_size - self.sent_details - self.failed_details
    }
}

/// Creates, lists and reads campaigns
#[derive(Clone)]
pub struct CampaignService {
    store: SharedStore,
}

impl CampaignService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Store a campaign
    ///
    /// The audience reference is not checked; a dangling reference only
    /// shows up when the campaign view is read.
    pub async fn create_campaign(&self, new: NewCampaign) -> Result<Campaign> {
        let campaign = Campaign::new(new.name, new.description, new.audience);
        self.store.save_campaign(&campaign).await?;

        tracing::info!(
            campaign_id = %campaign.id,
            audience = ?campaign.audience,
            "Campaign created"
        );
        Ok(campaign)
    }

    /// All campaigns, newest first
    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.store.list_campaigns().await
    }

    /// Load a campaign with its audience batch and delivery counts
    pub async fn get_campaign_view(&self, id: &CampaignId) -> Result<CampaignView> {
        let campaign = self
            .store
            .find_campaign(id)
            .await?
            .ok_or_else(|| Error::not_found("Campaign", id))?;

        let Some(batch_id) = campaign.audience.as_ref() else {
            return Err(Error::not_found("Audience", &campaign.id));
        };
        let audience = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| Error::not_found("Audience", batch_id))?;

        Ok(CampaignView::compose(campaign, audience))
    }
}
