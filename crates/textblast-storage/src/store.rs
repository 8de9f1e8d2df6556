//! Shared in-memory store backing the repositories

use crate::models::{
    Campaign, Contact, ContactGroup, FollowUpSequence, Message, MessageTemplate, ScheduledFollowUp,
};
use std::collections::HashMap;
use std::sync::Arc;
use textblast_common::types::{
    CampaignId, ContactId, GroupId, ScheduledFollowUpId, SequenceId, TemplateId,
};
use thiserror::Error;
use tokio::sync::RwLock;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// In-memory object store shared by all repositories
///
/// Cloning is cheap; clones share the same tables. Repositories are handed a
/// clone the same way a connection pool would be.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub(crate) contacts: Arc<RwLock<HashMap<ContactId, Contact>>>,
    pub(crate) groups: Arc<RwLock<HashMap<GroupId, ContactGroup>>>,
    pub(crate) templates: Arc<RwLock<HashMap<TemplateId, MessageTemplate>>>,
    pub(crate) campaigns: Arc<RwLock<HashMap<CampaignId, Campaign>>>,
    pub(crate) messages: Arc<RwLock<Vec<Message>>>,
    pub(crate) sequences: Arc<RwLock<HashMap<SequenceId, FollowUpSequence>>>,
    pub(crate) scheduled: Arc<RwLock<HashMap<ScheduledFollowUpId, ScheduledFollowUp>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every scheduled follow-up matching the predicate
    ///
    /// Used for cancellation and for the cascades that keep scheduled
    /// follow-ups from dangling when a contact, sequence, or campaign is
    /// deleted.
    pub(crate) async fn remove_scheduled_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&ScheduledFollowUp) -> bool,
    {
        let mut scheduled = self.scheduled.write().await;
        let before = scheduled.len();
        scheduled.retain(|_, item| !pred(item));
        let removed = before - scheduled.len();
        if removed > 0 {
            tracing::debug!("removed {} scheduled follow-ups", removed);
        }
        removed
    }
}
