//! Data model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use textblast_common::types::{
    CampaignId, ContactId, GroupId, MessageDirection, MessageId, ScheduledFollowUpId, SequenceId,
    TemplateId,
};

/// Contact model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub phone: String,
    pub name: Option<String>,
    /// Free-form attributes available to template placeholders
    pub attributes: serde_json::Value,
    pub group_ids: Vec<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create contact input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContact {
    pub phone: String,
    pub name: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub group_ids: Vec<GroupId>,
}

/// Update contact input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContact {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub group_ids: Option<Vec<GroupId>>,
}

/// Contact group model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGroup {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create contact group input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: Option<String>,
}

/// Message template model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: TemplateId,
    pub name: String,
    /// Body with `{{placeholder}}` variables
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create template input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub body: String,
}

/// Campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Sending,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl CampaignStatus {
    /// Whether this status is terminal
    ///
    /// Terminal states are absorbing: a finished campaign is never
    /// restarted, a new one must be created.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Completed | CampaignStatus::CompletedWithErrors | CampaignStatus::Failed
        )
    }

    /// Whether a transition from `self` to `to` is legal
    pub fn can_transition(&self, to: CampaignStatus) -> bool {
        match self {
            CampaignStatus::Draft => to == CampaignStatus::Sending,
            CampaignStatus::Sending => to.is_terminal(),
            _ => false,
        }
    }

    /// Derive the terminal status from a finished send's counters
    pub fn terminal(sent: i32, failed: i32, total: i32) -> CampaignStatus {
        if failed == 0 {
            CampaignStatus::Completed
        } else if sent == 0 && total > 0 {
            CampaignStatus::Failed
        } else {
            CampaignStatus::CompletedWithErrors
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Sending => write!(f, "sending"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::CompletedWithErrors => write!(f, "completed_with_errors"),
            CampaignStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "sending" => Ok(CampaignStatus::Sending),
            "completed" => Ok(CampaignStatus::Completed),
            "completed_with_errors" => Ok(CampaignStatus::CompletedWithErrors),
            "failed" => Ok(CampaignStatus::Failed),
            _ => Err(format!("Invalid campaign status: {}", s)),
        }
    }
}

/// Campaign model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    pub template_id: TemplateId,
    pub group_ids: Vec<GroupId>,
    pub sequence_id: Option<SequenceId>,
    pub follow_ups_enabled: bool,
    pub total_recipients: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Calculate progress percentage
    pub fn progress_percentage(&self) -> f64 {
        if self.total_recipients == 0 {
            0.0
        } else {
            ((self.sent_count + self.failed_count) as f64 / self.total_recipients as f64) * 100.0
        }
    }
}

/// Create campaign input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub template_id: TemplateId,
    pub group_ids: Vec<GroupId>,
    pub sequence_id: Option<SequenceId>,
    pub follow_ups_enabled: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Message status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
    Received,
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Failed => write!(f, "failed"),
            MessageStatus::Received => write!(f, "received"),
        }
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            "received" => Ok(MessageStatus::Received),
            _ => Err(format!("Invalid message status: {}", s)),
        }
    }
}

/// Message model
///
/// One row per delivery attempt or inbound reply. `campaign_id` is empty for
/// standalone follow-ups and manual sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub contact_id: ContactId,
    pub campaign_id: Option<CampaignId>,
    pub direction: MessageDirection,
    pub content: String,
    pub status: MessageStatus,
    pub error: Option<String>,
    pub is_follow_up: bool,
    pub follow_up_step: Option<i32>,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Create message input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub contact_id: ContactId,
    pub campaign_id: Option<CampaignId>,
    pub direction: MessageDirection,
    pub content: String,
    pub is_follow_up: bool,
    pub follow_up_step: Option<i32>,
    pub received_at: Option<DateTime<Utc>>,
}

impl CreateMessage {
    /// Outgoing campaign or manual message
    pub fn outgoing(
        contact_id: ContactId,
        campaign_id: Option<CampaignId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            contact_id,
            campaign_id,
            direction: MessageDirection::Outgoing,
            content: content.into(),
            is_follow_up: false,
            follow_up_step: None,
            received_at: None,
        }
    }

    /// Outgoing follow-up message for the given step
    pub fn follow_up(
        contact_id: ContactId,
        campaign_id: Option<CampaignId>,
        content: impl Into<String>,
        step_number: i32,
    ) -> Self {
        Self {
            contact_id,
            campaign_id,
            direction: MessageDirection::Outgoing,
            content: content.into(),
            is_follow_up: true,
            follow_up_step: Some(step_number),
            received_at: None,
        }
    }

    /// Inbound reply from a contact
    pub fn incoming(
        contact_id: ContactId,
        content: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            contact_id,
            campaign_id: None,
            direction: MessageDirection::Incoming,
            content: content.into(),
            is_follow_up: false,
            follow_up_step: None,
            received_at: Some(received_at),
        }
    }
}

/// One step of a follow-up sequence
///
/// `step_number` is 1-based and unique within the sequence; it defines
/// execution order. The delay is measured from the triggering send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpStep {
    pub step_number: i32,
    pub delay_days: i64,
    pub delay_hours: i64,
    pub template_id: TemplateId,
}

impl FollowUpStep {
    /// Delay of this step relative to the triggering send
    pub fn delay(&self) -> Duration {
        Duration::days(self.delay_days) + Duration::hours(self.delay_hours)
    }
}

/// Follow-up sequence model
///
/// Owns its steps; deleting the sequence deletes the steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpSequence {
    pub id: SequenceId,
    pub name: String,
    pub active: bool,
    /// Steps ordered by step number
    pub steps: Vec<FollowUpStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowUpSequence {
    /// Look up a step by its number
    pub fn step(&self, step_number: i32) -> Option<&FollowUpStep> {
        self.steps.iter().find(|s| s.step_number == step_number)
    }
}

/// Create sequence input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSequence {
    pub name: String,
    pub active: bool,
    pub steps: Vec<FollowUpStep>,
}

/// Scheduled follow-up
///
/// Existence in the store is the single source of truth for "will this
/// follow-up fire": removal is the cancellation, there is no second flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledFollowUp {
    pub id: ScheduledFollowUpId,
    pub contact_id: ContactId,
    pub campaign_id: CampaignId,
    pub sequence_id: SequenceId,
    pub step_number: i32,
    pub fire_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Create scheduled follow-up input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduledFollowUp {
    pub contact_id: ContactId,
    pub campaign_id: CampaignId,
    pub sequence_id: SequenceId,
    pub step_number: i32,
    pub fire_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_status_display_roundtrip() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Sending,
            CampaignStatus::Completed,
            CampaignStatus::CompletedWithErrors,
            CampaignStatus::Failed,
        ] {
            let parsed: CampaignStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_terminal_status_totality() {
        // every (sent, failed, total) with total > 0 derives exactly one state
        for total in 1..=5i32 {
            for failed in 0..=total {
                let sent = total - failed;
                let status = CampaignStatus::terminal(sent, failed, total);
                if failed == 0 {
                    assert_eq!(status, CampaignStatus::Completed);
                } else if sent == 0 {
                    assert_eq!(status, CampaignStatus::Failed);
                } else {
                    assert_eq!(status, CampaignStatus::CompletedWithErrors);
                }
                assert!(status.is_terminal());
            }
        }
    }

    #[test]
    fn test_status_transitions() {
        use CampaignStatus::*;

        assert!(Draft.can_transition(Sending));
        assert!(Sending.can_transition(Completed));
        assert!(Sending.can_transition(CompletedWithErrors));
        assert!(Sending.can_transition(Failed));

        // draft never jumps straight to a terminal state
        assert!(!Draft.can_transition(Completed));
        // terminal states are absorbing
        assert!(!Completed.can_transition(Sending));
        assert!(!Failed.can_transition(Draft));
    }

    #[test]
    fn test_step_delay() {
        let step = FollowUpStep {
            step_number: 1,
            delay_days: 2,
            delay_hours: 3,
            template_id: uuid::Uuid::new_v4(),
        };
        assert_eq!(step.delay(), Duration::hours(51));
    }

    #[test]
    fn test_progress_percentage() {
        let mut campaign = Campaign {
            id: uuid::Uuid::new_v4(),
            name: "test".to_string(),
            status: CampaignStatus::Sending,
            template_id: uuid::Uuid::new_v4(),
            group_ids: vec![],
            sequence_id: None,
            follow_ups_enabled: false,
            total_recipients: 20,
            sent_count: 4,
            failed_count: 1,
            scheduled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        assert_eq!(campaign.progress_percentage(), 25.0);

        campaign.total_recipients = 0;
        assert_eq!(campaign.progress_percentage(), 0.0);
    }
}
