//! Scheduled follow-up repository
//!
//! The schedule is the single source of truth for whether a follow-up will
//! fire. Removal is the cancellation; there is no separate cancelled flag,
//! so the two-state divergence bug class cannot occur.

use crate::models::{CreateScheduledFollowUp, ScheduledFollowUp};
use crate::store::{MemoryStore, StoreError};
use chrono::{DateTime, Utc};
use textblast_common::types::{CampaignId, ContactId, ScheduledFollowUpId, SequenceId};
use uuid::Uuid;

/// Repository for scheduled follow-ups
#[derive(Clone)]
pub struct MemScheduledFollowUpRepository {
    store: MemoryStore,
}

impl MemScheduledFollowUpRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new scheduled follow-up
    pub async fn create(
        &self,
        input: CreateScheduledFollowUp,
    ) -> Result<ScheduledFollowUp, StoreError> {
        let item = ScheduledFollowUp {
            id: Uuid::new_v4(),
            contact_id: input.contact_id,
            campaign_id: input.campaign_id,
            sequence_id: input.sequence_id,
            step_number: input.step_number,
            fire_at: input.fire_at,
            created_at: Utc::now(),
        };

        let mut scheduled = self.store.scheduled.write().await;
        scheduled.insert(item.id, item.clone());
        Ok(item)
    }

    /// Get a scheduled follow-up by id
    pub async fn get(
        &self,
        id: ScheduledFollowUpId,
    ) -> Result<Option<ScheduledFollowUp>, StoreError> {
        let scheduled = self.store.scheduled.read().await;
        Ok(scheduled.get(&id).cloned())
    }

    /// Cancel a scheduled follow-up
    ///
    /// Idempotent: cancelling an already-absent intent is a no-op, not an
    /// error. Returns whether anything was removed.
    pub async fn delete(&self, id: ScheduledFollowUpId) -> Result<bool, StoreError> {
        let mut scheduled = self.store.scheduled.write().await;
        Ok(scheduled.remove(&id).is_some())
    }

    /// Find the pending intent for a (contact, campaign, sequence, step)
    pub async fn find_pending(
        &self,
        contact_id: ContactId,
        campaign_id: CampaignId,
        sequence_id: SequenceId,
        step_number: i32,
    ) -> Result<Option<ScheduledFollowUp>, StoreError> {
        let scheduled = self.store.scheduled.read().await;
        Ok(scheduled
            .values()
            .find(|s| {
                s.contact_id == contact_id
                    && s.campaign_id == campaign_id
                    && s.sequence_id == sequence_id
                    && s.step_number == step_number
            })
            .cloned())
    }

    /// List every intent due at `now`, in fire order
    ///
    /// Sorted by fire time ascending, id as the deterministic tie-break.
    pub async fn list_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledFollowUp>, StoreError> {
        let scheduled = self.store.scheduled.read().await;
        let mut due: Vec<ScheduledFollowUp> = scheduled
            .values()
            .filter(|s| s.fire_at <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| (a.fire_at, a.id).cmp(&(b.fire_at, b.id)));
        Ok(due)
    }

    /// Cancel every pending follow-up for a contact
    pub async fn delete_by_contact(&self, contact_id: ContactId) -> Result<usize, StoreError> {
        Ok(self
            .store
            .remove_scheduled_where(|s| s.contact_id == contact_id)
            .await)
    }

    /// Cancel a contact's pending follow-ups for one campaign
    pub async fn delete_by_campaign_and_contact(
        &self,
        campaign_id: CampaignId,
        contact_id: ContactId,
    ) -> Result<usize, StoreError> {
        Ok(self
            .store
            .remove_scheduled_where(|s| s.campaign_id == campaign_id && s.contact_id == contact_id)
            .await)
    }

    /// List every pending follow-up for a campaign
    pub async fn list_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<ScheduledFollowUp>, StoreError> {
        let scheduled = self.store.scheduled.read().await;
        let mut items: Vec<ScheduledFollowUp> = scheduled
            .values()
            .filter(|s| s.campaign_id == campaign_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.fire_at, a.id).cmp(&(b.fire_at, b.id)));
        Ok(items)
    }

    /// Distinct campaigns that still have pending follow-ups
    pub async fn campaign_ids_with_pending(&self) -> Result<Vec<CampaignId>, StoreError> {
        let scheduled = self.store.scheduled.read().await;
        let mut ids: Vec<CampaignId> = scheduled.values().map(|s| s.campaign_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
