//! Follow-up executor - fires due intents through the transport

use crate::template::TemplateRenderer;
use crate::transport::MessageTransport;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use textblast_common::types::{PhoneNumber, ScheduledFollowUpId};
use textblast_storage::models::{CreateMessage, Message};
use textblast_storage::{
    ContactRepository, MessageRepository, ScheduledFollowUpRepository, SequenceRepository,
    StoreError, TemplateRepository,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Result of firing one scheduled follow-up
#[derive(Debug)]
pub enum FireOutcome {
    /// Follow-up delivered
    Sent(Message),
    /// Transport attempt failed; the intent is consumed, not retried
    Failed { message: Message, reason: String },
    /// The intent, its contact, its sequence, or its step no longer exists
    Skipped,
    /// The step references a template that no longer exists
    MissingTemplate { step_number: i32 },
}

/// Follow-up execution errors
#[derive(Error, Debug)]
pub enum FollowUpError {
    #[error("transport unavailable")]
    TransportUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one fire_all_due sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Intents that were due when the sweep started
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Human-readable reasons, one per failed or errored intent
    pub errors: Vec<String>,
}

/// Fires scheduled follow-ups: re-renders, transmits, records the message
pub struct FollowUpExecutor {
    scheduled: ScheduledFollowUpRepository,
    contacts: ContactRepository,
    sequences: SequenceRepository,
    templates: TemplateRepository,
    messages: MessageRepository,
    transport: Arc<dyn MessageTransport>,
    renderer: TemplateRenderer,
}

impl FollowUpExecutor {
    pub fn new(
        scheduled: ScheduledFollowUpRepository,
        contacts: ContactRepository,
        sequences: SequenceRepository,
        templates: TemplateRepository,
        messages: MessageRepository,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            scheduled,
            contacts,
            sequences,
            templates,
            messages,
            transport,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Fire one scheduled follow-up
    ///
    /// The caller's scheduling facility is trusted to invoke this at or
    /// after the intent's fire time. Cancellation removes the intent from
    /// the store before this read, so "no longer present" is a normal
    /// outcome, not an error. The intent is removed once a transport
    /// attempt was made, whatever its outcome; a storage failure before the
    /// attempt leaves it in place for a retry sweep.
    pub async fn fire(&self, id: ScheduledFollowUpId) -> Result<FireOutcome, FollowUpError> {
        if !self.transport.is_available() {
            return Err(FollowUpError::TransportUnavailable);
        }

        let Some(item) = self.scheduled.get(id).await? else {
            debug!("Follow-up {} already cancelled", id);
            return Ok(FireOutcome::Skipped);
        };

        let Some(contact) = self.contacts.get(item.contact_id).await? else {
            self.scheduled.delete(id).await?;
            return Ok(FireOutcome::Skipped);
        };

        let Some(sequence) = self.sequences.get(item.sequence_id).await? else {
            self.scheduled.delete(id).await?;
            return Ok(FireOutcome::Skipped);
        };
        let Some(step) = sequence.step(item.step_number) else {
            self.scheduled.delete(id).await?;
            return Ok(FireOutcome::Skipped);
        };

        let Some(template) = self.templates.get(step.template_id).await? else {
            warn!(
                "Follow-up step {} of sequence {} has no template, skipping",
                item.step_number, item.sequence_id
            );
            self.scheduled.delete(id).await?;
            return Ok(FireOutcome::MissingTemplate {
                step_number: item.step_number,
            });
        };

        // render against the contact's current data so template and contact
        // edits made after scheduling are honored
        let body = self.renderer.render(&template.body, &contact);
        let phone = PhoneNumber::parse(&contact.phone)
            .map(|p| p.to_string())
            .unwrap_or_else(|| contact.phone.clone());

        let message = self
            .messages
            .create(CreateMessage::follow_up(
                contact.id,
                Some(item.campaign_id),
                body.clone(),
                item.step_number,
            ))
            .await?;

        let outcome = match self.transport.send(&phone, &body).await {
            Ok(()) => {
                let sent = self.messages.mark_sent(message.id).await?.unwrap_or(message);
                FireOutcome::Sent(sent)
            }
            Err(e) => {
                let reason = e.to_string();
                let failed = self
                    .messages
                    .mark_failed(message.id, &reason)
                    .await?
                    .unwrap_or(message);
                FireOutcome::Failed {
                    message: failed,
                    reason,
                }
            }
        };

        // the attempt was made; the intent is consumed either way
        self.scheduled.delete(id).await?;
        Ok(outcome)
    }

    /// Fire every intent due at `now`, strictly one at a time
    ///
    /// Intents are processed in fire-time order (id as tie-break), each
    /// awaited before the next starts, so a backlog accumulated while the
    /// host was down does not burst concurrent transport calls. Per-intent
    /// failures never abort the sweep.
    pub async fn fire_all_due(&self, now: DateTime<Utc>) -> Result<SweepReport, FollowUpError> {
        if !self.transport.is_available() {
            return Err(FollowUpError::TransportUnavailable);
        }

        let due = self.scheduled.list_due(now).await?;
        let mut report = SweepReport {
            due: due.len(),
            ..Default::default()
        };

        for item in due {
            match self.fire(item.id).await {
                Ok(FireOutcome::Sent(_)) => report.sent += 1,
                Ok(FireOutcome::Failed { reason, .. }) => {
                    report.failed += 1;
                    report.errors.push(reason);
                }
                Ok(FireOutcome::Skipped) => report.skipped += 1,
                Ok(FireOutcome::MissingTemplate { step_number }) => {
                    report.failed += 1;
                    report
                        .errors
                        .push(format!("step {} has no template", step_number));
                }
                Err(e) => {
                    warn!("Follow-up {} errored: {}", item.id, e);
                    report.errors.push(e.to_string());
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestTransport;
    use chrono::Duration;
    use textblast_storage::models::{
        CreateContact, CreateScheduledFollowUp, CreateSequence, CreateTemplate, FollowUpStep,
        MessageStatus,
    };
    use textblast_storage::MemoryStore;
    use uuid::Uuid;

    struct Fixture {
        store: MemoryStore,
        scheduled: ScheduledFollowUpRepository,
        executor: FollowUpExecutor,
    }

    fn fixture(transport: Arc<TestTransport>) -> Fixture {
        let store = MemoryStore::new();
        let scheduled = ScheduledFollowUpRepository::new(store.clone());
        let executor = FollowUpExecutor::new(
            scheduled.clone(),
            ContactRepository::new(store.clone()),
            SequenceRepository::new(store.clone()),
            TemplateRepository::new(store.clone()),
            MessageRepository::new(store.clone()),
            transport,
        );
        Fixture {
            store,
            scheduled,
            executor,
        }
    }

    async fn seed_contact(store: &MemoryStore, phone: &str) -> Uuid {
        ContactRepository::new(store.clone())
            .create(CreateContact {
                phone: phone.to_string(),
                name: Some("Grace Hopper".to_string()),
                attributes: None,
                group_ids: vec![],
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_sequence(store: &MemoryStore, template_id: Uuid) -> Uuid {
        SequenceRepository::new(store.clone())
            .create(CreateSequence {
                name: "nurture".to_string(),
                active: true,
                steps: vec![FollowUpStep {
                    step_number: 1,
                    delay_days: 1,
                    delay_hours: 0,
                    template_id,
                }],
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_template(store: &MemoryStore, body: &str) -> Uuid {
        TemplateRepository::new(store.clone())
            .create(CreateTemplate {
                name: "followup".to_string(),
                body: body.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn schedule(
        f: &Fixture,
        contact_id: Uuid,
        sequence_id: Uuid,
        step_number: i32,
        fire_at: chrono::DateTime<Utc>,
    ) -> Uuid {
        f.scheduled
            .create(CreateScheduledFollowUp {
                contact_id,
                campaign_id: Uuid::new_v4(),
                sequence_id,
                step_number,
                fire_at,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_fire_sends_and_consumes_intent() {
        let transport = TestTransport::ok();
        let f = fixture(transport.clone());
        let contact_id = seed_contact(&f.store, "+15550000001").await;
        let template_id = seed_template(&f.store, "Hi {{first_name}}, checking in").await;
        let sequence_id = seed_sequence(&f.store, template_id).await;
        let id = schedule(&f, contact_id, sequence_id, 1, Utc::now()).await;

        let outcome = f.executor.fire(id).await.unwrap();
        let FireOutcome::Sent(message) = outcome else {
            panic!("expected sent outcome");
        };
        assert_eq!(message.content, "Hi Grace, checking in");
        assert!(message.is_follow_up);
        assert_eq!(message.follow_up_step, Some(1));
        assert_eq!(message.status, MessageStatus::Sent);

        assert!(f.scheduled.get(id).await.unwrap().is_none());
        assert_eq!(transport.calls(), vec!["+15550000001"]);
    }

    #[tokio::test]
    async fn test_fire_rerenders_current_template() {
        let f = fixture(TestTransport::ok());
        let contact_id = seed_contact(&f.store, "+15550000001").await;
        let template_id = seed_template(&f.store, "old body").await;
        let sequence_id = seed_sequence(&f.store, template_id).await;
        let id = schedule(&f, contact_id, sequence_id, 1, Utc::now()).await;

        // template edits between scheduling and firing are honored
        TemplateRepository::new(f.store.clone())
            .update_body(template_id, "new body")
            .await
            .unwrap();

        let FireOutcome::Sent(message) = f.executor.fire(id).await.unwrap() else {
            panic!("expected sent outcome");
        };
        assert_eq!(message.content, "new body");
    }

    #[tokio::test]
    async fn test_fire_missing_intent_is_normal() {
        let f = fixture(TestTransport::ok());
        let outcome = f.executor.fire(Uuid::new_v4()).await.unwrap();
        assert!(matches!(outcome, FireOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_fire_missing_template_skips_step() {
        let f = fixture(TestTransport::ok());
        let contact_id = seed_contact(&f.store, "+15550000001").await;
        let template_id = seed_template(&f.store, "body").await;
        let sequence_id = seed_sequence(&f.store, template_id).await;
        let id = schedule(&f, contact_id, sequence_id, 1, Utc::now()).await;

        TemplateRepository::new(f.store.clone())
            .delete(template_id)
            .await
            .unwrap();

        let outcome = f.executor.fire(id).await.unwrap();
        assert!(matches!(
            outcome,
            FireOutcome::MissingTemplate { step_number: 1 }
        ));
        // a step that can never succeed is not retried
        assert!(f.scheduled.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_attempt_consumes_intent() {
        let f = fixture(TestTransport::failing(&["+15550000001"]));
        let contact_id = seed_contact(&f.store, "+15550000001").await;
        let template_id = seed_template(&f.store, "body").await;
        let sequence_id = seed_sequence(&f.store, template_id).await;
        let id = schedule(&f, contact_id, sequence_id, 1, Utc::now()).await;

        let FireOutcome::Failed { message, reason } = f.executor.fire(id).await.unwrap() else {
            panic!("expected failed outcome");
        };
        assert_eq!(message.status, MessageStatus::Failed);
        assert!(reason.contains("rejected"));

        // failed follow-ups are surfaced, not auto-retried
        assert!(f.scheduled.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fire_all_due_is_ordered_and_complete() {
        let transport = TestTransport::ok();
        let f = fixture(transport.clone());
        let template_id = seed_template(&f.store, "body").await;
        let sequence_id = seed_sequence(&f.store, template_id).await;
        let now = Utc::now();

        let c1 = seed_contact(&f.store, "+15550000001").await;
        let c2 = seed_contact(&f.store, "+15550000002").await;
        let c3 = seed_contact(&f.store, "+15550000003").await;

        // inserted out of order; the sweep fires in fire-time order
        schedule(&f, c2, sequence_id, 1, now - Duration::hours(2)).await;
        schedule(&f, c1, sequence_id, 1, now - Duration::hours(3)).await;
        schedule(&f, c3, sequence_id, 1, now - Duration::hours(1)).await;
        // not yet due
        let future = seed_contact(&f.store, "+15550000004").await;
        schedule(&f, future, sequence_id, 1, now + Duration::hours(1)).await;

        let report = f.executor.fire_all_due(now).await.unwrap();
        assert_eq!(report.due, 3);
        assert_eq!(report.sent, 3);
        assert_eq!(
            transport.calls(),
            vec!["+15550000001", "+15550000002", "+15550000003"]
        );

        // the future intent is untouched
        assert_eq!(
            f.scheduled
                .list_due(now + Duration::hours(2))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_reply_before_fire_time_silences_contact() {
        use crate::followup::{FollowUpScheduler, ResponseMonitor};
        use textblast_storage::models::CreateCampaign;
        use textblast_storage::CampaignRepository;

        let transport = TestTransport::ok();
        let f = fixture(transport.clone());
        let template_id = seed_template(&f.store, "following up").await;

        let sequence = SequenceRepository::new(f.store.clone())
            .create(CreateSequence {
                name: "nurture".to_string(),
                active: true,
                steps: vec![
                    FollowUpStep {
                        step_number: 1,
                        delay_days: 1,
                        delay_hours: 0,
                        template_id,
                    },
                    FollowUpStep {
                        step_number: 2,
                        delay_days: 3,
                        delay_hours: 0,
                        template_id,
                    },
                ],
            })
            .await
            .unwrap();

        let campaign = CampaignRepository::new(f.store.clone())
            .create(CreateCampaign {
                name: "launch".to_string(),
                template_id,
                group_ids: vec![],
                sequence_id: Some(sequence.id),
                follow_ups_enabled: true,
                scheduled_at: None,
            })
            .await
            .unwrap();

        let replier = seed_contact(&f.store, "+15550000001").await;
        let silent = seed_contact(&f.store, "+15550000002").await;
        let t0 = Utc::now();

        FollowUpScheduler::new(f.scheduled.clone())
            .schedule(&campaign, &[replier, silent], &sequence, t0)
            .await
            .unwrap();

        // reply lands twelve hours in, before either step's fire time
        ResponseMonitor::new(MessageRepository::new(f.store.clone()), f.scheduled.clone())
            .record_incoming(replier, "please stop", t0 + Duration::hours(12))
            .await
            .unwrap();

        // four days later both steps are past due; none fire for the replier
        let report = f
            .executor
            .fire_all_due(t0 + Duration::days(4))
            .await
            .unwrap();
        assert_eq!(report.due, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(
            transport.calls(),
            vec!["+15550000002", "+15550000002"]
        );
    }

    #[tokio::test]
    async fn test_unavailable_transport_leaves_intents() {
        let f = fixture(TestTransport::unavailable());
        let contact_id = seed_contact(&f.store, "+15550000001").await;
        let template_id = seed_template(&f.store, "body").await;
        let sequence_id = seed_sequence(&f.store, template_id).await;
        let id = schedule(&f, contact_id, sequence_id, 1, Utc::now()).await;

        let result = f.executor.fire_all_due(Utc::now()).await;
        assert!(matches!(result, Err(FollowUpError::TransportUnavailable)));
        assert!(f.scheduled.get(id).await.unwrap().is_some());
    }
}
