use std::time::Duration;

use crate::models::result::DifficultyTier;
use crate::repository::RepositorySettings;
use crate::services::ServiceSettings;

/// Process-level configuration, read once at startup. Database settings
/// live in [`crate::db::DbConfig`]; everything here has a working default
/// so the service runs with zero environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub default_tier: DifficultyTier,
    pub duplicate_window: Duration,
    pub recent_exclusion_window: usize,
    pub trend_window: usize,
    pub consistency_calibration: f64,
    pub storage_timeout: Duration,
    /// Optional path to a JSON question bank replacing the built-in one.
    pub content_bank_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let default_tier = std::env::var("DEFAULT_TIER")
            .ok()
            .and_then(|value| DifficultyTier::parse(&value))
            .unwrap_or(DifficultyTier::Intermediate);

        let duplicate_window = Duration::from_secs(env_parse("DUPLICATE_WINDOW_SECS", 300));
        let recent_exclusion_window = env_parse("RECENT_EXCLUSION_WINDOW", 3);
        let trend_window = env_parse("TREND_WINDOW", 5);
        let consistency_calibration = env_parse("CONSISTENCY_CALIBRATION", 2.0);
        let storage_timeout = Duration::from_millis(env_parse("STORAGE_TIMEOUT_MS", 5000));

        let content_bank_path = std::env::var("CONTENT_BANK_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Self {
            log_level,
            default_tier,
            duplicate_window,
            recent_exclusion_window,
            trend_window,
            consistency_calibration,
            storage_timeout,
            content_bank_path,
        }
    }

    pub fn repository_settings(&self) -> RepositorySettings {
        RepositorySettings {
            default_tier: self.default_tier,
            storage_timeout: self.storage_timeout,
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            duplicate_window: self.duplicate_window,
            recent_exclusion_window: self.recent_exclusion_window,
            trend_window: self.trend_window,
            consistency_calibration: self.consistency_calibration,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_tier: DifficultyTier::Intermediate,
            duplicate_window: Duration::from_secs(300),
            recent_exclusion_window: 3,
            trend_window: 5,
            consistency_calibration: 2.0,
            storage_timeout: Duration::from_millis(5000),
            content_bank_path: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}
