//! Campaign repository

use crate::models::{Campaign, CampaignStatus, CreateCampaign};
use crate::store::{MemoryStore, StoreError};
use chrono::{DateTime, Utc};
use textblast_common::types::CampaignId;
use uuid::Uuid;

/// Repository for campaigns
#[derive(Clone)]
pub struct MemCampaignRepository {
    store: MemoryStore,
}

impl MemCampaignRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new campaign in draft status
    pub async fn create(&self, input: CreateCampaign) -> Result<Campaign, StoreError> {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: input.name,
            status: CampaignStatus::Draft,
            template_id: input.template_id,
            group_ids: input.group_ids,
            sequence_id: input.sequence_id,
            follow_ups_enabled: input.follow_ups_enabled,
            total_recipients: 0,
            sent_count: 0,
            failed_count: 0,
            scheduled_at: input.scheduled_at,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        };

        let mut campaigns = self.store.campaigns.write().await;
        campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    /// Get a campaign by id
    pub async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, StoreError> {
        let campaigns = self.store.campaigns.read().await;
        Ok(campaigns.get(&id).cloned())
    }

    /// List all campaigns, newest first
    pub async fn list(&self) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.store.campaigns.read().await;
        let mut all: Vec<Campaign> = campaigns.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    /// Update a campaign's status
    ///
    /// Enforces the lifecycle: draft -> sending -> one terminal state.
    /// Terminal states are absorbing. Timestamps are stamped on the
    /// transitions that define them.
    pub async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, StoreError> {
        let mut campaigns = self.store.campaigns.write().await;
        let Some(campaign) = campaigns.get_mut(&id) else {
            return Ok(None);
        };

        if !campaign.status.can_transition(status) {
            return Err(StoreError::Constraint(format!(
                "illegal campaign transition {} -> {}",
                campaign.status, status
            )));
        }

        let now = Utc::now();
        campaign.status = status;
        campaign.updated_at = now;
        match status {
            CampaignStatus::Sending => campaign.started_at = Some(now),
            s if s.is_terminal() => campaign.completed_at = Some(now),
            _ => {}
        }

        Ok(Some(campaign.clone()))
    }

    /// Fix the total recipient count when a send begins
    pub async fn set_total_recipients(
        &self,
        id: CampaignId,
        total: i32,
    ) -> Result<Option<Campaign>, StoreError> {
        let mut campaigns = self.store.campaigns.write().await;
        let Some(campaign) = campaigns.get_mut(&id) else {
            return Ok(None);
        };

        campaign.total_recipients = total;
        campaign.updated_at = Utc::now();
        Ok(Some(campaign.clone()))
    }

    /// Update the sent/failed counters
    pub async fn update_counts(
        &self,
        id: CampaignId,
        sent: i32,
        failed: i32,
    ) -> Result<Option<Campaign>, StoreError> {
        let mut campaigns = self.store.campaigns.write().await;
        let Some(campaign) = campaigns.get_mut(&id) else {
            return Ok(None);
        };

        if sent + failed > campaign.total_recipients {
            return Err(StoreError::Constraint(format!(
                "sent ({}) + failed ({}) exceeds total recipients ({})",
                sent, failed, campaign.total_recipients
            )));
        }

        campaign.sent_count = sent;
        campaign.failed_count = failed;
        campaign.updated_at = Utc::now();
        Ok(Some(campaign.clone()))
    }

    /// List draft campaigns whose scheduled time has passed
    pub async fn list_due_scheduled(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.store.campaigns.read().await;
        let mut due: Vec<Campaign> = campaigns
            .values()
            .filter(|c| {
                c.status == CampaignStatus::Draft
                    && c.scheduled_at.map(|at| at <= now).unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by_key(|c| c.scheduled_at);
        Ok(due)
    }

    /// Delete a campaign, cancelling its pending follow-ups
    pub async fn delete(&self, id: CampaignId) -> Result<bool, StoreError> {
        let removed = {
            let mut campaigns = self.store.campaigns.write().await;
            campaigns.remove(&id).is_some()
        };

        if removed {
            self.store
                .remove_scheduled_where(|s| s.campaign_id == id)
                .await;
        }

        Ok(removed)
    }
}
