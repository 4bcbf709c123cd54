//! In-memory learner store. Backs tests and embedded deployments that run
//! without Postgres; behaves like the Postgres store, including the
//! revision compare-and-swap (the whole operation runs under one write
//! lock, so it is atomic per store).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::learner_store::{LearnerStore, StoredLearner};
use crate::db::StorageError;

#[derive(Default)]
pub struct MemoryLearnerStore {
    records: RwLock<HashMap<String, StoredLearner>>,
}

impl MemoryLearnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LearnerStore for MemoryLearnerStore {
    async fn fetch(&self, identifier: &str) -> Result<Option<StoredLearner>, StorageError> {
        Ok(self.records.read().await.get(identifier).cloned())
    }

    async fn insert_if_absent(&self, record: &StoredLearner) -> Result<bool, StorageError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.identifier) {
            return Ok(false);
        }
        let mut fresh = record.clone();
        fresh.revision = 0;
        records.insert(fresh.identifier.clone(), fresh);
        Ok(true)
    }

    async fn replace(
        &self,
        expected_revision: i64,
        record: &StoredLearner,
    ) -> Result<bool, StorageError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.identifier) {
            Some(existing) if existing.revision == expected_revision => {
                let mut updated = record.clone();
                updated.revision = expected_revision + 1;
                *existing = updated;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, identifier: &str) -> Result<bool, StorageError> {
        Ok(self.records.write().await.remove(identifier).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let store = MemoryLearnerStore::new();
        let record = StoredLearner::new("a@x.com", "Ada");
        assert!(store.insert_if_absent(&record).await.unwrap());
        assert!(!store.insert_if_absent(&record).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_replace_requires_matching_revision() {
        let store = MemoryLearnerStore::new();
        let mut record = StoredLearner::new("a@x.com", "Ada");
        store.insert_if_absent(&record).await.unwrap();

        record.display_name = "Ada L".into();
        assert!(store.replace(0, &record).await.unwrap());

        // Stale revision loses.
        record.display_name = "stale".into();
        assert!(!store.replace(0, &record).await.unwrap());

        let stored = store.fetch("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Ada L");
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryLearnerStore::new();
        store
            .insert_if_absent(&StoredLearner::new("a@x.com", "Ada"))
            .await
            .unwrap();
        assert!(store.delete("a@x.com").await.unwrap());
        assert!(!store.delete("a@x.com").await.unwrap());
    }
}
