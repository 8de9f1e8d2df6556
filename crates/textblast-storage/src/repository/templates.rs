//! Message template repository

use crate::models::{CreateTemplate, MessageTemplate};
use crate::store::{MemoryStore, StoreError};
use chrono::Utc;
use textblast_common::types::TemplateId;
use uuid::Uuid;

/// Repository for message templates
#[derive(Clone)]
pub struct MemTemplateRepository {
    store: MemoryStore,
}

impl MemTemplateRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new template
    pub async fn create(&self, input: CreateTemplate) -> Result<MessageTemplate, StoreError> {
        let now = Utc::now();
        let template = MessageTemplate {
            id: Uuid::new_v4(),
            name: input.name,
            body: input.body,
            created_at: now,
            updated_at: now,
        };

        let mut templates = self.store.templates.write().await;
        templates.insert(template.id, template.clone());
        Ok(template)
    }

    /// Get a template by id
    pub async fn get(&self, id: TemplateId) -> Result<Option<MessageTemplate>, StoreError> {
        let templates = self.store.templates.read().await;
        Ok(templates.get(&id).cloned())
    }

    /// Replace a template's body
    pub async fn update_body(
        &self,
        id: TemplateId,
        body: impl Into<String>,
    ) -> Result<Option<MessageTemplate>, StoreError> {
        let mut templates = self.store.templates.write().await;
        let Some(template) = templates.get_mut(&id) else {
            return Ok(None);
        };

        template.body = body.into();
        template.updated_at = Utc::now();
        Ok(Some(template.clone()))
    }

    /// Delete a template
    pub async fn delete(&self, id: TemplateId) -> Result<bool, StoreError> {
        let mut templates = self.store.templates.write().await;
        Ok(templates.remove(&id).is_some())
    }
}
