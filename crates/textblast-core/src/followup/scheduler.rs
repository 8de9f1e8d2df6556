//! Follow-up scheduler - creates deferred send intents after a campaign send

use chrono::{DateTime, Utc};
use textblast_common::types::ContactId;
use textblast_storage::models::{
    Campaign, CreateScheduledFollowUp, FollowUpSequence, ScheduledFollowUp,
};
use textblast_storage::{ScheduledFollowUpRepository, StoreError};
use tracing::debug;

/// Schedules one deferred intent per (contact, step) after a campaign send
pub struct FollowUpScheduler {
    scheduled: ScheduledFollowUpRepository,
}

impl FollowUpScheduler {
    pub fn new(scheduled: ScheduledFollowUpRepository) -> Self {
        Self { scheduled }
    }

    /// Schedule every step of an active sequence for every targeted contact
    ///
    /// Each step gets its own absolute fire time computed from `base_time`;
    /// steps are independent, nothing waits for an earlier step to fire.
    /// Idempotent per (contact, campaign, sequence, step): a pair that
    /// already has a pending intent is left untouched. Returns only the
    /// intents created by this call.
    pub async fn schedule(
        &self,
        campaign: &Campaign,
        contact_ids: &[ContactId],
        sequence: &FollowUpSequence,
        base_time: DateTime<Utc>,
    ) -> Result<Vec<ScheduledFollowUp>, StoreError> {
        if !sequence.active {
            debug!("Sequence {} is inactive, nothing scheduled", sequence.id);
            return Ok(Vec::new());
        }

        let mut created = Vec::new();
        for &contact_id in contact_ids {
            for step in &sequence.steps {
                let existing = self
                    .scheduled
                    .find_pending(contact_id, campaign.id, sequence.id, step.step_number)
                    .await?;
                if existing.is_some() {
                    continue;
                }

                let item = self
                    .scheduled
                    .create(CreateScheduledFollowUp {
                        contact_id,
                        campaign_id: campaign.id,
                        sequence_id: sequence.id,
                        step_number: step.step_number,
                        fire_at: base_time + step.delay(),
                    })
                    .await?;
                created.push(item);
            }
        }

        debug!(
            "Scheduled {} follow-ups for campaign {}",
            created.len(),
            campaign.id
        );
        Ok(created)
    }
}
