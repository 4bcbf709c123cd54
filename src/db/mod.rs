pub mod learner_store;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| DbConfigError::MissingUrl)?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        Ok(Self {
            url,
            max_connections,
            acquire_timeout: Duration::from_secs(5),
        })
    }
}

#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: PgPool,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;
        Self::connect(config).await
    }

    pub async fn connect(config: DbConfig) -> Result<Arc<Self>, DbInitError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(DbInitError::Sqlx)?;

        Ok(Arc::new(Self { config, pool }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.config.url
    }
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// How a storage fault should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Exceeded the caller-supplied deadline. Retryable.
    Timeout,
    /// Connectivity/pool-level fault. Retryable.
    Connection,
    /// Constraint or integrity violation. Never retried.
    Integrity,
    /// Stored record could not be decoded. Never retried.
    Serialization,
    Other,
}

/// Wraps any storage-layer fault, carrying the failed operation and the
/// learner identifier it was operating on.
#[derive(Debug, Error)]
#[error("storage operation '{operation}' failed for learner '{identifier}': {message}")]
pub struct StorageError {
    pub operation: &'static str,
    pub identifier: String,
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(
        operation: &'static str,
        identifier: &str,
        kind: StorageErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            identifier: identifier.to_string(),
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(operation: &'static str, identifier: &str) -> Self {
        Self::new(operation, identifier, StorageErrorKind::Timeout, "timed out")
    }

    pub fn from_sqlx(operation: &'static str, identifier: &str, err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageErrorKind::Connection
            }
            sqlx::Error::Database(db) if db.constraint().is_some() => StorageErrorKind::Integrity,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StorageErrorKind::Serialization
            }
            _ => StorageErrorKind::Other,
        };
        Self::new(operation, identifier, kind, err.to_string())
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self.kind,
            StorageErrorKind::Timeout | StorageErrorKind::Connection
        )
    }
}
