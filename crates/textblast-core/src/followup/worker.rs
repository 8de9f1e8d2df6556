//! Follow-up worker - periodic processing loop
//!
//! The host's scheduling facility: a polling ticker that drives the reply
//! sweep, fires due follow-ups, and starts due scheduled campaigns. The
//! poll interval must stay well under one hour, the finest follow-up delay
//! unit, so due intents do not drift.

use crate::campaign::{BatchPolicy, CampaignManager};
use crate::followup::executor::FollowUpExecutor;
use crate::followup::monitor::ResponseMonitor;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use textblast_storage::{CampaignRepository, ScheduledFollowUpRepository};
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info};

/// Background worker driving follow-up execution and scheduled campaigns
pub struct FollowUpWorker {
    executor: FollowUpExecutor,
    monitor: ResponseMonitor,
    manager: Arc<CampaignManager>,
    campaigns: CampaignRepository,
    scheduled: ScheduledFollowUpRepository,
    policy: BatchPolicy,
    poll_interval_secs: u64,
    reply_sweep: bool,
}

impl FollowUpWorker {
    pub fn new(
        executor: FollowUpExecutor,
        monitor: ResponseMonitor,
        manager: Arc<CampaignManager>,
        campaigns: CampaignRepository,
        scheduled: ScheduledFollowUpRepository,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            executor,
            monitor,
            manager,
            campaigns,
            scheduled,
            policy,
            poll_interval_secs: 60,
            reply_sweep: true,
        }
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Enable or disable the per-campaign reply sweep
    pub fn with_reply_sweep(mut self, enabled: bool) -> Self {
        self.reply_sweep = enabled;
        self
    }

    /// Run the worker loop
    pub async fn run(&self) {
        let mut ticker = interval(TokioDuration::from_secs(self.poll_interval_secs));

        info!(
            "Follow-up worker started (interval: {}s, reply sweep: {})",
            self.poll_interval_secs, self.reply_sweep
        );

        loop {
            ticker.tick().await;

            if let Err(e) = self.process_cycle().await {
                error!("Worker cycle error: {}", e);
            }
        }
    }

    /// One processing cycle: reply sweep, due follow-ups, due campaigns
    ///
    /// The reply sweep runs before firing so replies received since the
    /// last cycle cancel follow-ups that would otherwise fire now.
    pub async fn process_cycle(&self) -> Result<()> {
        let now = Utc::now();

        if self.reply_sweep {
            for campaign_id in self.scheduled.campaign_ids_with_pending().await? {
                let Some(campaign) = self.campaigns.get(campaign_id).await? else {
                    continue;
                };
                let since = campaign
                    .completed_at
                    .or(campaign.started_at)
                    .unwrap_or(campaign.created_at);
                self.monitor.cancel_for_campaign(campaign_id, since).await?;
            }
        }

        let report = self.executor.fire_all_due(now).await?;
        if report.due > 0 {
            info!(
                "Follow-up sweep: {} due, {} sent, {} failed, {} skipped",
                report.due, report.sent, report.failed, report.skipped
            );
        }

        let started = self.manager.run_due_scheduled(now, &self.policy).await?;
        if started > 0 {
            info!("Started {} scheduled campaigns", started);
        }

        Ok(())
    }
}
