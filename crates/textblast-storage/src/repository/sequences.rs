//! Follow-up sequence repository

use crate::models::{CreateSequence, FollowUpSequence};
use crate::store::{MemoryStore, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use textblast_common::types::SequenceId;
use uuid::Uuid;

/// Repository for follow-up sequences
#[derive(Clone)]
pub struct MemSequenceRepository {
    store: MemoryStore,
}

impl MemSequenceRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a new sequence
    ///
    /// Step numbers must be 1-based and unique within the sequence; steps
    /// are stored ordered by step number.
    pub async fn create(&self, input: CreateSequence) -> Result<FollowUpSequence, StoreError> {
        let mut seen = HashSet::new();
        for step in &input.steps {
            if step.step_number < 1 {
                return Err(StoreError::Constraint(format!(
                    "step number must be 1-based, got {}",
                    step.step_number
                )));
            }
            if !seen.insert(step.step_number) {
                return Err(StoreError::Constraint(format!(
                    "duplicate step number {}",
                    step.step_number
                )));
            }
        }

        let mut steps = input.steps;
        steps.sort_by_key(|s| s.step_number);

        let now = Utc::now();
        let sequence = FollowUpSequence {
            id: Uuid::new_v4(),
            name: input.name,
            active: input.active,
            steps,
            created_at: now,
            updated_at: now,
        };

        let mut sequences = self.store.sequences.write().await;
        sequences.insert(sequence.id, sequence.clone());
        Ok(sequence)
    }

    /// Get a sequence by id, steps ordered by step number
    pub async fn get(&self, id: SequenceId) -> Result<Option<FollowUpSequence>, StoreError> {
        let sequences = self.store.sequences.read().await;
        Ok(sequences.get(&id).cloned())
    }

    /// Enable or disable a sequence
    pub async fn set_active(
        &self,
        id: SequenceId,
        active: bool,
    ) -> Result<Option<FollowUpSequence>, StoreError> {
        let mut sequences = self.store.sequences.write().await;
        let Some(sequence) = sequences.get_mut(&id) else {
            return Ok(None);
        };

        sequence.active = active;
        sequence.updated_at = Utc::now();
        Ok(Some(sequence.clone()))
    }

    /// Delete a sequence
    ///
    /// Steps are owned by the sequence and die with it; pending scheduled
    /// follow-ups referencing the sequence are cancelled.
    pub async fn delete(&self, id: SequenceId) -> Result<bool, StoreError> {
        let removed = {
            let mut sequences = self.store.sequences.write().await;
            sequences.remove(&id).is_some()
        };

        if removed {
            self.store
                .remove_scheduled_where(|s| s.sequence_id == id)
                .await;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateScheduledFollowUp, FollowUpStep};
    use crate::repository::ScheduledFollowUpRepository;

    fn step(number: i32) -> FollowUpStep {
        FollowUpStep {
            step_number: number,
            delay_days: 1,
            delay_hours: 0,
            template_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_steps_sorted_on_create() {
        let repo = MemSequenceRepository::new(MemoryStore::new());

        let sequence = repo
            .create(CreateSequence {
                name: "nurture".to_string(),
                active: true,
                steps: vec![step(3), step(1), step(2)],
            })
            .await
            .unwrap();

        let numbers: Vec<i32> = sequence.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_step_rejected() {
        let repo = MemSequenceRepository::new(MemoryStore::new());

        let result = repo
            .create(CreateSequence {
                name: "broken".to_string(),
                active: true,
                steps: vec![step(1), step(1)],
            })
            .await;
        assert!(matches!(result, Err(StoreError::Constraint(_))));

        let result = repo
            .create(CreateSequence {
                name: "zero-based".to_string(),
                active: true,
                steps: vec![step(0)],
            })
            .await;
        assert!(matches!(result, Err(StoreError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_delete_cancels_scheduled() {
        let store = MemoryStore::new();
        let repo = MemSequenceRepository::new(store.clone());
        let scheduled = ScheduledFollowUpRepository::new(store);

        let sequence = repo
            .create(CreateSequence {
                name: "nurture".to_string(),
                active: true,
                steps: vec![step(1)],
            })
            .await
            .unwrap();

        scheduled
            .create(CreateScheduledFollowUp {
                contact_id: Uuid::new_v4(),
                campaign_id: Uuid::new_v4(),
                sequence_id: sequence.id,
                step_number: 1,
                fire_at: Utc::now(),
            })
            .await
            .unwrap();

        repo.delete(sequence.id).await.unwrap();
        assert!(scheduled.list_due(Utc::now()).await.unwrap().is_empty());
    }
}
