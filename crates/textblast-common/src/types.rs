//! Common types for TextBlast

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for contacts
pub type ContactId = Uuid;

/// Unique identifier for contact groups
pub type GroupId = Uuid;

/// Unique identifier for message templates
pub type TemplateId = Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for messages
pub type MessageId = Uuid;

/// Unique identifier for follow-up sequences
pub type SequenceId = Uuid;

/// Unique identifier for scheduled follow-ups
pub type ScheduledFollowUpId = Uuid;

/// Timestamp wrapper
pub type Timestamp = DateTime<Utc>;

/// Phone number in normalized form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// Digits only, no separators
    pub digits: String,
    /// Whether the number carries an international prefix
    pub international: bool,
}

impl PhoneNumber {
    /// Parse a phone number from a string
    ///
    /// Accepts common separators (spaces, dashes, dots, parentheses) and an
    /// optional leading `+`. Numbers must contain 7 to 15 digits.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let international = trimmed.starts_with('+');

        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 7 || digits.len() > 15 {
            return None;
        }

        // Reject anything with characters other than digits and separators
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')'));
        if !valid {
            return None;
        }

        Some(Self {
            digits,
            international,
        })
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.international {
            write!(f, "+{}", self.digits)
        } else {
            write!(f, "{}", self.digits)
        }
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::Validation("Invalid phone number".to_string()))
    }
}

/// Direction of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

impl std::fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageDirection::Incoming => write!(f, "incoming"),
            MessageDirection::Outgoing => write!(f, "outgoing"),
        }
    }
}
