//! Message repository

use crate::models::{CreateMessage, Message, MessageStatus};
use crate::store::{MemoryStore, StoreError};
use chrono::{DateTime, Utc};
use textblast_common::types::{CampaignId, ContactId, MessageDirection, MessageId};
use uuid::Uuid;

/// Repository for messages
#[derive(Clone)]
pub struct MemMessageRepository {
    store: MemoryStore,
}

impl MemMessageRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new message
    ///
    /// Outgoing messages start `pending`; inbound messages are stored as
    /// `received` with their receive timestamp.
    pub async fn create(&self, input: CreateMessage) -> Result<Message, StoreError> {
        let status = match input.direction {
            MessageDirection::Outgoing => MessageStatus::Pending,
            MessageDirection::Incoming => MessageStatus::Received,
        };

        let message = Message {
            id: Uuid::new_v4(),
            contact_id: input.contact_id,
            campaign_id: input.campaign_id,
            direction: input.direction,
            content: input.content,
            status,
            error: None,
            is_follow_up: input.is_follow_up,
            follow_up_step: input.follow_up_step,
            sent_at: None,
            received_at: input.received_at,
            created_at: Utc::now(),
        };

        let mut messages = self.store.messages.write().await;
        messages.push(message.clone());
        Ok(message)
    }

    /// Get a message by id
    pub async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let messages = self.store.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    /// Mark a message as sent
    pub async fn mark_sent(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let mut messages = self.store.messages.write().await;
        let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        message.status = MessageStatus::Sent;
        message.sent_at = Some(Utc::now());
        Ok(Some(message.clone()))
    }

    /// Mark a message as failed with a reason
    pub async fn mark_failed(
        &self,
        id: MessageId,
        error: &str,
    ) -> Result<Option<Message>, StoreError> {
        let mut messages = self.store.messages.write().await;
        let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        message.status = MessageStatus::Failed;
        message.error = match message.error.take() {
            Some(existing) => Some(format!("{}; {}", existing, error)),
            None => Some(error.to_string()),
        };
        Ok(Some(message.clone()))
    }

    /// List a contact's messages in creation order
    pub async fn list_by_contact(&self, contact_id: ContactId) -> Result<Vec<Message>, StoreError> {
        let messages = self.store.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.contact_id == contact_id)
            .cloned()
            .collect())
    }

    /// List a campaign's messages in creation order
    pub async fn list_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = self.store.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.campaign_id == Some(campaign_id))
            .cloned()
            .collect())
    }

    /// Whether the contact has any inbound message after `since`
    pub async fn has_incoming_since(
        &self,
        contact_id: ContactId,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let messages = self.store.messages.read().await;
        Ok(messages.iter().any(|m| {
            m.contact_id == contact_id
                && m.direction == MessageDirection::Incoming
                && m.received_at.map(|at| at > since).unwrap_or(false)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_outgoing_starts_pending() {
        let repo = MemMessageRepository::new(MemoryStore::new());
        let contact_id = Uuid::new_v4();

        let message = repo
            .create(CreateMessage::outgoing(contact_id, None, "hello"))
            .await
            .unwrap();
        assert_eq!(message.status, MessageStatus::Pending);
        assert!(!message.is_follow_up);

        let sent = repo.mark_sent(message.id).await.unwrap().unwrap();
        assert_eq!(sent.status, MessageStatus::Sent);
        assert!(sent.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_failed_appends_reason() {
        let repo = MemMessageRepository::new(MemoryStore::new());

        let message = repo
            .create(CreateMessage::outgoing(Uuid::new_v4(), None, "hello"))
            .await
            .unwrap();

        repo.mark_failed(message.id, "gateway timeout").await.unwrap();
        let failed = repo
            .mark_failed(message.id, "still unreachable")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            failed.error.as_deref(),
            Some("gateway timeout; still unreachable")
        );
    }

    #[tokio::test]
    async fn test_has_incoming_since() {
        let repo = MemMessageRepository::new(MemoryStore::new());
        let contact_id = Uuid::new_v4();
        let now = Utc::now();

        repo.create(CreateMessage::incoming(
            contact_id,
            "yes please",
            now - Duration::hours(1),
        ))
        .await
        .unwrap();

        assert!(repo
            .has_incoming_since(contact_id, now - Duration::hours(2))
            .await
            .unwrap());
        assert!(!repo.has_incoming_since(contact_id, now).await.unwrap());
        assert!(!repo
            .has_incoming_since(Uuid::new_v4(), now - Duration::hours(2))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_follow_up_message_carries_step() {
        let repo = MemMessageRepository::new(MemoryStore::new());

        let message = repo
            .create(CreateMessage::follow_up(
                Uuid::new_v4(),
                Some(Uuid::new_v4()),
                "checking in",
                2,
            ))
            .await
            .unwrap();
        assert!(message.is_follow_up);
        assert_eq!(message.follow_up_step, Some(2));
    }
}
