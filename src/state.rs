use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::AppConfig;
use crate::content::{ContentPoolError, QuestionBank};
use crate::db::learner_store::{LearnerStore, PgLearnerStore};
use crate::db::memory::MemoryLearnerStore;
use crate::db::DatabaseProxy;
use crate::repository::LearnerRepository;
use crate::services::clock::SystemClock;
use crate::services::directory::{NullDirectory, UserDirectory};
use crate::services::LearnerService;

/// Shared application state: configuration plus the wired-up learner
/// service. Cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: AppConfig,
    db_proxy: Option<Arc<DatabaseProxy>>,
    service: Arc<LearnerService>,
}

impl AppState {
    /// Wire up the full stack from the environment. A reachable database
    /// gives durable storage; otherwise state falls back to the in-memory
    /// store so the service stays usable in development.
    pub async fn from_env() -> Result<Self, ContentPoolError> {
        dotenvy::dotenv().ok();
        let config = AppConfig::from_env();

        let (db_proxy, store): (Option<Arc<DatabaseProxy>>, Arc<dyn LearnerStore>) =
            match DatabaseProxy::from_env().await {
                Ok(proxy) => {
                    let pg = PgLearnerStore::new(proxy.clone());
                    if let Err(err) = pg.ensure_schema().await {
                        tracing::warn!(error = %err, "schema setup failed, using in-memory storage");
                        (None, Arc::new(MemoryLearnerStore::new()))
                    } else {
                        tracing::info!("connected to postgres");
                        (Some(proxy), Arc::new(pg))
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "database unavailable, using in-memory storage");
                    (None, Arc::new(MemoryLearnerStore::new()))
                }
            };

        let mut state = Self::with_store(config, store, Arc::new(NullDirectory))?;
        state.db_proxy = db_proxy;
        Ok(state)
    }

    /// Assemble state over an explicit store and directory. Used directly
    /// by tests and by [`AppState::from_env`].
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn LearnerStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, ContentPoolError> {
        let question_bank = match &config.content_bank_path {
            Some(path) => {
                let bank = QuestionBank::from_json_file(path)?;
                tracing::info!(path = %path, "loaded question bank from file");
                bank
            }
            None => QuestionBank::built_in(),
        };

        let repository = LearnerRepository::new(store, config.repository_settings());
        let service = LearnerService::new(
            repository,
            Arc::new(question_bank),
            directory,
            Arc::new(SystemClock),
            config.service_settings(),
        );

        Ok(Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config,
            db_proxy: None,
            service: Arc::new(service),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn service(&self) -> Arc<LearnerService> {
        Arc::clone(&self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_store_wires_a_usable_service() {
        let state = AppState::with_store(
            AppConfig::default(),
            Arc::new(MemoryLearnerStore::new()),
            Arc::new(NullDirectory),
        )
        .unwrap();
        assert!(state.db_proxy().is_none());
        assert!(state.uptime_seconds() < 5);
    }
}
