//! Campaign manager - lifecycle and send orchestration

use crate::campaign::sender::{
    AbortHandle, BatchPolicy, BulkSender, ProgressFn, SendError, SendReport,
};
use crate::followup::FollowUpScheduler;
use crate::resolver::{RecipientResolver, ResolveError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use textblast_common::types::CampaignId;
use textblast_storage::models::CampaignStatus;
use textblast_storage::{CampaignRepository, SequenceRepository, StoreError};
use thiserror::Error;
use tracing::{info, warn};

/// Campaign manager errors
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("campaign not found")]
    NotFound,

    #[error("campaign is not in draft status")]
    NotDraft,

    #[error("campaign resolved no recipients")]
    NoRecipients,

    #[error("transport unavailable")]
    TransportUnavailable,

    #[error("campaign template not found")]
    MissingTemplate,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ResolveError> for CampaignError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::MissingTemplate => CampaignError::MissingTemplate,
            ResolveError::Store(e) => CampaignError::Store(e),
        }
    }
}

impl From<SendError> for CampaignError {
    fn from(e: SendError) -> Self {
        match e {
            SendError::NoRecipients => CampaignError::NoRecipients,
            SendError::TransportUnavailable => CampaignError::TransportUnavailable,
            SendError::Store(e) => CampaignError::Store(e),
        }
    }
}

/// Manages campaign lifecycle: draft -> sending -> terminal state
///
/// The manager instance driving a campaign's send is the only writer of its
/// sent/failed counters.
pub struct CampaignManager {
    campaigns: CampaignRepository,
    sequences: SequenceRepository,
    resolver: Arc<dyn RecipientResolver>,
    sender: BulkSender,
    scheduler: FollowUpScheduler,
}

impl CampaignManager {
    pub fn new(
        campaigns: CampaignRepository,
        sequences: SequenceRepository,
        resolver: Arc<dyn RecipientResolver>,
        sender: BulkSender,
        scheduler: FollowUpScheduler,
    ) -> Self {
        Self {
            campaigns,
            sequences,
            resolver,
            sender,
            scheduler,
        }
    }

    /// Run a draft campaign to completion
    ///
    /// Fail-fast conditions (unknown campaign, not draft, no recipients,
    /// transport unavailable) leave the campaign untouched in draft. Once
    /// the send starts, the campaign always reaches exactly one terminal
    /// state, derived from the final counters.
    pub async fn run_campaign(
        &self,
        campaign_id: CampaignId,
        policy: &BatchPolicy,
        progress: &ProgressFn,
        abort: &AbortHandle,
    ) -> Result<SendReport, CampaignError> {
        let campaign = self
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        if campaign.status != CampaignStatus::Draft {
            return Err(CampaignError::NotDraft);
        }

        let intents = self.resolver.resolve(&campaign).await?;
        self.sender.preflight(&intents)?;

        let total = intents.len();
        self.campaigns
            .update_status(campaign_id, CampaignStatus::Sending)
            .await?
            .ok_or(CampaignError::NotFound)?;
        self.campaigns
            .set_total_recipients(campaign_id, total as i32)
            .await?;

        info!(
            "Campaign {} started sending to {} recipients",
            campaign_id, total
        );

        let contact_ids: Vec<_> = intents.iter().map(|i| i.contact_id).collect();
        let report = self
            .sender
            .send(Some(campaign_id), intents, policy, progress, abort)
            .await?;

        self.campaigns
            .update_counts(
                campaign_id,
                report.total_sent as i32,
                report.total_failed as i32,
            )
            .await?;

        let terminal = CampaignStatus::terminal(
            report.total_sent as i32,
            report.total_failed as i32,
            total as i32,
        );
        self.campaigns.update_status(campaign_id, terminal).await?;

        info!(
            "Campaign {} finished: {} sent, {} failed ({})",
            campaign_id, report.total_sent, report.total_failed, terminal
        );

        if campaign.follow_ups_enabled {
            if let Some(sequence_id) = campaign.sequence_id {
                match self.sequences.get(sequence_id).await? {
                    Some(sequence) => {
                        let created = self
                            .scheduler
                            .schedule(&campaign, &contact_ids, &sequence, Utc::now())
                            .await?;
                        info!(
                            "Scheduled {} follow-ups for campaign {}",
                            created.len(),
                            campaign_id
                        );
                    }
                    None => warn!(
                        "Campaign {} references missing follow-up sequence {}",
                        campaign_id, sequence_id
                    ),
                }
            }
        }

        Ok(report)
    }

    /// Start every draft campaign whose scheduled time has passed
    ///
    /// Per-campaign errors are logged, not propagated, so one broken
    /// campaign cannot block the rest.
    pub async fn run_due_scheduled(
        &self,
        now: DateTime<Utc>,
        policy: &BatchPolicy,
    ) -> Result<usize, StoreError> {
        let due = self.campaigns.list_due_scheduled(now).await?;
        let mut started = 0;

        for campaign in due {
            info!(
                "Starting scheduled campaign {} ({})",
                campaign.id, campaign.name
            );
            let abort = AbortHandle::new();
            match self
                .run_campaign(campaign.id, policy, &|_, _| {}, &abort)
                .await
            {
                Ok(_) => started += 1,
                Err(e) => warn!("Scheduled campaign {} failed to run: {}", campaign.id, e),
            }
        }

        Ok(started)
    }
}
