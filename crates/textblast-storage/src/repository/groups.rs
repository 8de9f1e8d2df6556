//! Contact group repository

use crate::models::{ContactGroup, CreateGroup};
use crate::store::{MemoryStore, StoreError};
use chrono::Utc;
use textblast_common::types::GroupId;
use uuid::Uuid;

/// Repository for contact groups
#[derive(Clone)]
pub struct MemGroupRepository {
    store: MemoryStore,
}

impl MemGroupRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new group
    pub async fn create(&self, input: CreateGroup) -> Result<ContactGroup, StoreError> {
        let group = ContactGroup {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            created_at: Utc::now(),
        };

        let mut groups = self.store.groups.write().await;
        groups.insert(group.id, group.clone());
        Ok(group)
    }

    /// Get a group by id
    pub async fn get(&self, id: GroupId) -> Result<Option<ContactGroup>, StoreError> {
        let groups = self.store.groups.read().await;
        Ok(groups.get(&id).cloned())
    }

    /// List all groups, ordered by name
    pub async fn list(&self) -> Result<Vec<ContactGroup>, StoreError> {
        let groups = self.store.groups.read().await;
        let mut all: Vec<ContactGroup> = groups.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    /// Delete a group and remove it from every contact's memberships
    pub async fn delete(&self, id: GroupId) -> Result<bool, StoreError> {
        let removed = {
            let mut groups = self.store.groups.write().await;
            groups.remove(&id).is_some()
        };

        if removed {
            let mut contacts = self.store.contacts.write().await;
            for contact in contacts.values_mut() {
                contact.group_ids.retain(|g| *g != id);
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateContact;
    use crate::repository::ContactRepository;

    #[tokio::test]
    async fn test_create_list_delete() {
        let repo = MemGroupRepository::new(MemoryStore::new());

        let group = repo
            .create(CreateGroup {
                name: "Leads".to_string(),
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(repo.delete(group.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_clears_memberships() {
        let store = MemoryStore::new();
        let groups = MemGroupRepository::new(store.clone());
        let contacts = ContactRepository::new(store);

        let group = groups
            .create(CreateGroup {
                name: "Leads".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let contact = contacts
            .create(CreateContact {
                phone: "+15551234567".to_string(),
                name: None,
                attributes: None,
                group_ids: vec![group.id],
            })
            .await
            .unwrap();

        groups.delete(group.id).await.unwrap();

        let updated = contacts.get(contact.id).await.unwrap().unwrap();
        assert!(updated.group_ids.is_empty());
    }
}
