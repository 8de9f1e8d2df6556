//! Demo mode - seeds sample data and exercises the engine end to end

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use textblast_core::{AbortHandle, BatchPolicy, CampaignManager, FollowUpExecutor, ResponseMonitor};
use textblast_storage::models::{
    CreateCampaign, CreateContact, CreateGroup, CreateSequence, CreateTemplate, FollowUpStep,
};
use textblast_storage::{
    CampaignRepository, ContactRepository, GroupRepository, MemoryStore, SequenceRepository,
    TemplateRepository,
};
use tracing::info;

/// Seed a small campaign, send it, simulate one reply, and fire the
/// follow-ups as if their delays had elapsed
pub async fn run(
    store: MemoryStore,
    manager: Arc<CampaignManager>,
    monitor: ResponseMonitor,
    executor: FollowUpExecutor,
    policy: &BatchPolicy,
) -> Result<()> {
    info!("Running demo campaign");

    let groups = GroupRepository::new(store.clone());
    let contacts = ContactRepository::new(store.clone());
    let templates = TemplateRepository::new(store.clone());
    let sequences = SequenceRepository::new(store.clone());
    let campaigns = CampaignRepository::new(store);

    let group = groups
        .create(CreateGroup {
            name: "Demo leads".to_string(),
            description: None,
        })
        .await?;

    let names = [
        "Ada Lovelace",
        "Brian Kernighan",
        "Grace Hopper",
        "Dennis Ritchie",
        "Barbara Liskov",
        "Ken Thompson",
        "Frances Allen",
        "Donald Knuth",
        "Radia Perlman",
        "Tony Hoare",
        "Margaret Hamilton",
        "John Backus",
    ];
    let mut contact_ids = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let contact = contacts
            .create(CreateContact {
                phone: format!("+1555000{:04}", i + 1),
                name: Some(name.to_string()),
                attributes: None,
                group_ids: vec![group.id],
            })
            .await?;
        contact_ids.push(contact.id);
    }

    let intro = templates
        .create(CreateTemplate {
            name: "intro".to_string(),
            body: "Hi {{first_name}}, thanks for your interest! Reply STOP to opt out."
                .to_string(),
        })
        .await?;
    let nudge = templates
        .create(CreateTemplate {
            name: "nudge".to_string(),
            body: "Hi {{first_name}}, just checking in. Still interested?".to_string(),
        })
        .await?;

    let sequence = sequences
        .create(CreateSequence {
            name: "two-step nurture".to_string(),
            active: true,
            steps: vec![
                FollowUpStep {
                    step_number: 1,
                    delay_days: 1,
                    delay_hours: 0,
                    template_id: nudge.id,
                },
                FollowUpStep {
                    step_number: 2,
                    delay_days: 3,
                    delay_hours: 0,
                    template_id: nudge.id,
                },
            ],
        })
        .await?;

    let campaign = campaigns
        .create(CreateCampaign {
            name: "Demo launch".to_string(),
            template_id: intro.id,
            group_ids: vec![group.id],
            sequence_id: Some(sequence.id),
            follow_ups_enabled: true,
            scheduled_at: None,
        })
        .await?;

    let report = manager
        .run_campaign(
            campaign.id,
            policy,
            &|done, total| info!("Progress: {}/{}", done, total),
            &AbortHandle::new(),
        )
        .await?;
    info!(
        "Send finished: {} sent, {} failed of {}",
        report.total_sent, report.total_failed, report.total_messages
    );
    for failure in &report.failures {
        info!("  failed: {} ({})", failure.phone, failure.reason);
    }

    // one recipient replies, silencing their follow-ups
    monitor
        .record_incoming(contact_ids[0], "Sounds great, count me in!", Utc::now())
        .await?;

    // pretend the follow-up delays have elapsed
    let sweep = executor.fire_all_due(Utc::now() + Duration::days(4)).await?;
    info!(
        "Follow-up sweep: {} due, {} sent, {} failed, {} skipped",
        sweep.due, sweep.sent, sweep.failed, sweep.skipped
    );

    info!("Demo complete");
    Ok(())
}
