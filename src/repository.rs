//! Durable CRUD for learner profiles over a [`LearnerStore`].
//!
//! Invariants owned here: identifiers are normalized before any lookup,
//! history is re-parsed through the normalizer on every load (stored shapes
//! are never trusted), derived summary fields are recomputed on every read
//! and write, and appends go through a revision compare-and-swap so
//! concurrent submissions for one learner can never share a sequence
//! number.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::db::learner_store::{LearnerStore, StoredLearner};
use crate::db::{StorageError, StorageErrorKind};
use crate::models::learner::normalize_identifier;
use crate::models::result::{DifficultyTier, TestResult};
use crate::models::LearnerProfile;
use crate::normalize;

/// Bounded attempts for the append CAS loop. Each lost race re-reads the
/// record, so contention resolves quickly; exhausting this means something
/// is rewriting the record faster than we can read it.
const MAX_APPEND_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("learner not found: {0}")]
pub struct NotFoundError(pub String);

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct RepositorySettings {
    pub default_tier: DifficultyTier,
    pub storage_timeout: Duration,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            default_tier: DifficultyTier::Intermediate,
            storage_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Clone)]
pub struct LearnerRepository {
    store: Arc<dyn LearnerStore>,
    settings: RepositorySettings,
}

impl LearnerRepository {
    pub fn new(store: Arc<dyn LearnerStore>, settings: RepositorySettings) -> Self {
        Self { store, settings }
    }

    pub fn default_tier(&self) -> DifficultyTier {
        self.settings.default_tier
    }

    pub async fn find(&self, identifier: &str) -> Result<Option<LearnerProfile>, StorageError> {
        let identifier = normalize_identifier(identifier);
        let stored = self.fetch_with_retry(&identifier).await?;
        Ok(stored.map(|record| self.profile_from_stored(&record)))
    }

    /// Idempotent creation: an existing profile comes back unchanged, the
    /// stored display name is preserved.
    pub async fn create_if_absent(
        &self,
        identifier: &str,
        display_name: &str,
    ) -> Result<LearnerProfile, StorageError> {
        let identifier = normalize_identifier(identifier);

        if let Some(record) = self.fetch_with_retry(&identifier).await? {
            return Ok(self.profile_from_stored(&record));
        }

        let fresh = StoredLearner::new(&identifier, display_name);
        let inserted = self
            .timed("create_if_absent", &identifier, self.store.insert_if_absent(&fresh))
            .await?;
        if inserted {
            tracing::info!(identifier = %identifier, "created learner profile");
            return Ok(self.profile_from_stored(&fresh));
        }

        // Lost an insert race; the record exists now.
        let record = self
            .fetch_with_retry(&identifier)
            .await?
            .ok_or_else(|| {
                StorageError::new(
                    "create_if_absent",
                    &identifier,
                    StorageErrorKind::Other,
                    "record vanished after insert conflict",
                )
            })?;
        Ok(self.profile_from_stored(&record))
    }

    /// Append a result to an existing learner's history. Assigns the
    /// sequence number, inserts at the head, recomputes derived fields and
    /// persists the whole record in one conditional write.
    pub async fn append_result(
        &self,
        identifier: &str,
        result: TestResult,
    ) -> Result<LearnerProfile, RepositoryError> {
        let identifier = normalize_identifier(identifier);

        for attempt in 0..MAX_APPEND_ATTEMPTS {
            let record = self
                .fetch_with_retry(&identifier)
                .await?
                .ok_or_else(|| NotFoundError(identifier.clone()))?;

            let mut appended = result.clone();
            appended.sequence_number = record.history.len() as u32 + 1;

            let mut history: Vec<Value> = Vec::with_capacity(record.history.len() + 1);
            history.push(normalize::to_stored(&appended));
            history.extend(record.history.iter().cloned());

            let updated = StoredLearner {
                identifier: identifier.clone(),
                display_name: record.display_name.clone(),
                history,
                revision: record.revision,
            };

            let replaced = self
                .timed("append_result", &identifier, self.store.replace(record.revision, &updated))
                .await?;
            if replaced {
                tracing::info!(
                    identifier = %identifier,
                    sequence_number = appended.sequence_number,
                    band = appended.scores.overall,
                    "appended test result"
                );
                return Ok(self.profile_from_stored(&updated));
            }

            tracing::debug!(identifier = %identifier, attempt, "append lost a revision race, re-reading");
        }

        Err(StorageError::new(
            "append_result",
            &identifier,
            StorageErrorKind::Other,
            format!("revision conflict persisted after {MAX_APPEND_ATTEMPTS} attempts"),
        )
        .into())
    }

    pub async fn delete(&self, identifier: &str) -> Result<bool, StorageError> {
        let identifier = normalize_identifier(identifier);
        let first = self
            .timed("delete", &identifier, self.store.delete(&identifier))
            .await;
        match first {
            Ok(existed) => Ok(existed),
            Err(err) if err.retryable() => {
                tracing::warn!(identifier = %identifier, error = %err, "retrying delete once");
                self.timed("delete", &identifier, self.store.delete(&identifier))
                    .await
            }
            Err(err) => Err(err),
        }
    }

    // ========== Internals ==========

    async fn fetch_with_retry(
        &self,
        identifier: &str,
    ) -> Result<Option<StoredLearner>, StorageError> {
        let first = self
            .timed("fetch", identifier, self.store.fetch(identifier))
            .await;
        match first {
            Ok(record) => Ok(record),
            Err(err) if err.retryable() => {
                tracing::warn!(identifier = %identifier, error = %err, "retrying fetch once");
                self.timed("fetch", identifier, self.store.fetch(identifier))
                    .await
            }
            Err(err) => Err(err),
        }
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        identifier: &str,
        fut: impl std::future::Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.settings.storage_timeout, fut).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StorageError::timeout(operation, identifier)),
        }
    }

    /// Rebuild the in-memory profile from a stored record: every entry goes
    /// through the normalizer (legacy shapes included), undecodable entries
    /// are skipped with a warning, ordering is newest-first, and the summary
    /// is recomputed from scratch.
    fn profile_from_stored(&self, record: &StoredLearner) -> LearnerProfile {
        let mut history: Vec<TestResult> = Vec::with_capacity(record.history.len());
        for entry in &record.history {
            match normalize::from_stored(entry) {
                Ok(result) => history.push(result),
                Err(err) => {
                    tracing::warn!(
                        identifier = %record.identifier,
                        error = %err,
                        "skipping undecodable history entry"
                    );
                }
            }
        }

        history.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.sequence_number.cmp(&a.sequence_number))
        });

        let mut profile = LearnerProfile {
            identifier: record.identifier.clone(),
            display_name: record.display_name.clone(),
            history,
            summary: crate::models::ProfileSummary::from_history(&[], self.settings.default_tier),
        };
        profile.recompute_summary(self.settings.default_tier);
        profile
    }
}
