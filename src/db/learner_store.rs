use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::Row;

use crate::db::{DatabaseProxy, StorageError};

/// Persisted representation of one learner, exactly the stored record shape
/// the repository serializes (history entries stay opaque JSON here; the
/// normalizer owns their shape). `revision` backs conditional writes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLearner {
    pub identifier: String,
    pub display_name: String,
    pub history: Vec<Value>,
    pub revision: i64,
}

impl StoredLearner {
    pub fn new(identifier: &str, display_name: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            history: Vec::new(),
            revision: 0,
        }
    }
}

/// Record-level storage primitives. `replace` is a compare-and-swap on
/// `revision`: per-identifier writes serialize through it, so two
/// concurrent appends can never both observe the same history length.
#[async_trait]
pub trait LearnerStore: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<Option<StoredLearner>, StorageError>;

    /// Insert a fresh record; returns false when one already exists.
    async fn insert_if_absent(&self, record: &StoredLearner) -> Result<bool, StorageError>;

    /// Atomically replace the record if its revision still matches
    /// `expected_revision`; the stored revision increments on success.
    /// Returns false on a revision mismatch (concurrent writer won).
    async fn replace(
        &self,
        expected_revision: i64,
        record: &StoredLearner,
    ) -> Result<bool, StorageError>;

    async fn delete(&self, identifier: &str) -> Result<bool, StorageError>;
}

pub struct PgLearnerStore {
    proxy: Arc<DatabaseProxy>,
}

impl PgLearnerStore {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self { proxy }
    }

    /// Create the learners table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "learners" (
                "identifier" TEXT PRIMARY KEY,
                "displayName" TEXT NOT NULL,
                "history" JSONB NOT NULL DEFAULT '[]'::jsonb,
                "revision" BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.proxy.pool())
        .await
        .map_err(|e| StorageError::from_sqlx("ensure_schema", "", e))?;
        Ok(())
    }
}

#[async_trait]
impl LearnerStore for PgLearnerStore {
    async fn fetch(&self, identifier: &str) -> Result<Option<StoredLearner>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT "displayName", "history", "revision"
            FROM "learners"
            WHERE "identifier" = $1
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(self.proxy.pool())
        .await
        .map_err(|e| StorageError::from_sqlx("fetch", identifier, e))?;

        let Some(row) = row else { return Ok(None) };

        let display_name: String = row
            .try_get("displayName")
            .map_err(|e| StorageError::from_sqlx("fetch", identifier, e))?;
        let history: Value = row
            .try_get("history")
            .map_err(|e| StorageError::from_sqlx("fetch", identifier, e))?;
        let revision: i64 = row
            .try_get("revision")
            .map_err(|e| StorageError::from_sqlx("fetch", identifier, e))?;

        let history = match history {
            Value::Array(entries) => entries,
            other => {
                tracing::warn!(
                    identifier,
                    "stored history is not an array ({}), treating as empty",
                    other.to_string()
                );
                Vec::new()
            }
        };

        Ok(Some(StoredLearner {
            identifier: identifier.to_string(),
            display_name,
            history,
            revision,
        }))
    }

    async fn insert_if_absent(&self, record: &StoredLearner) -> Result<bool, StorageError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO "learners" ("identifier", "displayName", "history", "revision")
            VALUES ($1, $2, $3, 0)
            ON CONFLICT ("identifier") DO NOTHING
            "#,
        )
        .bind(&record.identifier)
        .bind(&record.display_name)
        .bind(Value::Array(record.history.clone()))
        .execute(self.proxy.pool())
        .await
        .map_err(|e| StorageError::from_sqlx("insert_if_absent", &record.identifier, e))?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn replace(
        &self,
        expected_revision: i64,
        record: &StoredLearner,
    ) -> Result<bool, StorageError> {
        let outcome = sqlx::query(
            r#"
            UPDATE "learners"
            SET "displayName" = $2,
                "history" = $3,
                "revision" = "revision" + 1
            WHERE "identifier" = $1
              AND "revision" = $4
            "#,
        )
        .bind(&record.identifier)
        .bind(&record.display_name)
        .bind(Value::Array(record.history.clone()))
        .bind(expected_revision)
        .execute(self.proxy.pool())
        .await
        .map_err(|e| StorageError::from_sqlx("replace", &record.identifier, e))?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn delete(&self, identifier: &str) -> Result<bool, StorageError> {
        let outcome = sqlx::query(r#"DELETE FROM "learners" WHERE "identifier" = $1"#)
            .bind(identifier)
            .execute(self.proxy.pool())
            .await
            .map_err(|e| StorageError::from_sqlx("delete", identifier, e))?;
        Ok(outcome.rows_affected() == 1)
    }
}
