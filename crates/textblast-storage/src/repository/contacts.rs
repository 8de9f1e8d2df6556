//! Contact repository

use crate::models::{Contact, CreateContact, UpdateContact};
use crate::store::{MemoryStore, StoreError};
use chrono::Utc;
use textblast_common::types::{ContactId, GroupId};
use uuid::Uuid;

/// Repository for contacts
#[derive(Clone)]
pub struct MemContactRepository {
    store: MemoryStore,
}

impl MemContactRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new contact
    pub async fn create(&self, input: CreateContact) -> Result<Contact, StoreError> {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            phone: input.phone,
            name: input.name,
            attributes: input.attributes.unwrap_or_else(|| serde_json::json!({})),
            group_ids: input.group_ids,
            created_at: now,
            updated_at: now,
        };

        let mut contacts = self.store.contacts.write().await;
        contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    /// Get a contact by id
    pub async fn get(&self, id: ContactId) -> Result<Option<Contact>, StoreError> {
        let contacts = self.store.contacts.read().await;
        Ok(contacts.get(&id).cloned())
    }

    /// Update a contact
    pub async fn update(
        &self,
        id: ContactId,
        input: UpdateContact,
    ) -> Result<Option<Contact>, StoreError> {
        let mut contacts = self.store.contacts.write().await;
        let Some(contact) = contacts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(phone) = input.phone {
            contact.phone = phone;
        }
        if let Some(name) = input.name {
            contact.name = Some(name);
        }
        if let Some(attributes) = input.attributes {
            contact.attributes = attributes;
        }
        if let Some(group_ids) = input.group_ids {
            contact.group_ids = group_ids;
        }
        contact.updated_at = Utc::now();

        Ok(Some(contact.clone()))
    }

    /// Delete a contact
    ///
    /// Cancels any pending scheduled follow-ups for the contact so no
    /// dangling references remain.
    pub async fn delete(&self, id: ContactId) -> Result<bool, StoreError> {
        let removed = {
            let mut contacts = self.store.contacts.write().await;
            contacts.remove(&id).is_some()
        };

        if removed {
            self.store
                .remove_scheduled_where(|s| s.contact_id == id)
                .await;
        }

        Ok(removed)
    }

    /// List the contacts belonging to any of the given groups
    ///
    /// The result is deduplicated by contact id and ordered by creation time
    /// (id as tie-break) so callers see a stable recipient order.
    pub async fn list_by_groups(&self, group_ids: &[GroupId]) -> Result<Vec<Contact>, StoreError> {
        let contacts = self.store.contacts.read().await;
        let mut matched: Vec<Contact> = contacts
            .values()
            .filter(|c| c.group_ids.iter().any(|g| group_ids.contains(g)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(matched)
    }
}
