//! Response monitor - inbound replies cancel pending follow-ups

use chrono::{DateTime, Utc};
use textblast_common::types::{CampaignId, ContactId};
use textblast_storage::models::{CreateMessage, Message};
use textblast_storage::{MessageRepository, ScheduledFollowUpRepository, StoreError};
use tracing::info;

/// Records inbound messages and cancels the replying contact's follow-ups
pub struct ResponseMonitor {
    messages: MessageRepository,
    scheduled: ScheduledFollowUpRepository,
}

impl ResponseMonitor {
    pub fn new(messages: MessageRepository, scheduled: ScheduledFollowUpRepository) -> Self {
        Self {
            messages,
            scheduled,
        }
    }

    /// Record an inbound reply and silence the contact's pending follow-ups
    ///
    /// Any reply cancels every pending follow-up for that contact,
    /// regardless of campaign, step, or fire time. Cancellation is
    /// idempotent: nothing pending is a no-op.
    pub async fn record_incoming(
        &self,
        contact_id: ContactId,
        content: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Result<Message, StoreError> {
        let message = self
            .messages
            .create(CreateMessage::incoming(contact_id, content, received_at))
            .await?;

        let cancelled = self.scheduled.delete_by_contact(contact_id).await?;
        if cancelled > 0 {
            info!(
                "Cancelled {} pending follow-ups for contact {} after reply",
                cancelled, contact_id
            );
        }

        Ok(message)
    }

    /// Cancel follow-ups for campaign recipients that replied after `since`
    ///
    /// The coarse sweep variant: for every contact with a pending follow-up
    /// from the campaign, any inbound message after `since` cancels that
    /// contact's pending follow-ups for this campaign only.
    pub async fn cancel_for_campaign(
        &self,
        campaign_id: CampaignId,
        since: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let pending = self.scheduled.list_by_campaign(campaign_id).await?;
        let mut contact_ids: Vec<ContactId> = pending.iter().map(|p| p.contact_id).collect();
        contact_ids.sort();
        contact_ids.dedup();

        let mut cancelled = 0;
        for contact_id in contact_ids {
            if self.messages.has_incoming_since(contact_id, since).await? {
                cancelled += self
                    .scheduled
                    .delete_by_campaign_and_contact(campaign_id, contact_id)
                    .await?;
            }
        }

        if cancelled > 0 {
            info!(
                "Reply sweep cancelled {} follow-ups for campaign {}",
                cancelled, campaign_id
            );
        }
        Ok(cancelled)
    }
}
