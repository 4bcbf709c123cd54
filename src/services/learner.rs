//! Learner service facade: the one entry point agent-side callers use.
//!
//! Wires the normalizer, repository, content selector and analytics
//! together. `submit_result` is the loose string-returning surface the
//! conversational layer consumes; `try_submit_result` is its typed twin.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::analytics::{self, AnalyticsReport, TrendDirection};
use crate::content::{
    select_question_set, ContentPoolError, PartExclusions, QuestionBank, QuestionSet,
};
use crate::db::StorageError;
use crate::models::learner::normalize_identifier;
use crate::models::result::{DifficultyTier, TestResult};
use crate::models::LearnerProfile;
use crate::normalize::{self, ValidationError};
use crate::repository::{LearnerRepository, NotFoundError, RepositoryError};
use crate::services::clock::Clock;
use crate::services::directory::{fallback_display_name, UserDirectory};

#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "duplicate submission for {identifier}: band {band} at {tier} tier was recorded {seconds_ago}s ago"
)]
pub struct DuplicateSubmissionError {
    pub identifier: String,
    pub band: f64,
    pub tier: String,
    pub seconds_ago: i64,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid result payload: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Duplicate(#[from] DuplicateSubmissionError),
    #[error(transparent)]
    Content(#[from] ContentPoolError),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(e) => ServiceError::NotFound(e),
            RepositoryError::Storage(e) => ServiceError::Storage(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub duplicate_window: Duration,
    pub recent_exclusion_window: usize,
    pub trend_window: usize,
    pub consistency_calibration: f64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            duplicate_window: Duration::from_secs(300),
            recent_exclusion_window: 3,
            trend_window: analytics::DEFAULT_TREND_WINDOW,
            consistency_calibration: analytics::DEFAULT_CONSISTENCY_CALIBRATION,
        }
    }
}

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub identifier: String,
    pub display_name: String,
    pub sequence_number: u32,
    pub overall_band: f64,
    pub tier: DifficultyTier,
    pub total_completed: u32,
}

/// Everything a new assessment session needs up front.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    /// Fresh id the submission can carry back as `session_id`.
    pub session_id: String,
    pub identifier: String,
    pub tier: DifficultyTier,
    pub question_set: QuestionSet,
    pub performance_summary: String,
}

#[derive(Clone)]
pub struct LearnerService {
    repository: LearnerRepository,
    question_bank: Arc<QuestionBank>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
}

impl LearnerService {
    pub fn new(
        repository: LearnerRepository,
        question_bank: Arc<QuestionBank>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            repository,
            question_bank,
            directory,
            clock,
            settings,
        }
    }

    /// Load a profile, creating it on first contact. The display name comes
    /// from the caller, then the directory, then the identifier itself.
    pub async fn get_or_create(
        &self,
        identifier: &str,
        display_name: Option<&str>,
    ) -> Result<LearnerProfile, ServiceError> {
        if let Some(existing) = self.repository.find(identifier).await? {
            return Ok(existing);
        }

        let resolved = match display_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => match self.directory.display_name(identifier).await {
                Some(name) => name,
                None => fallback_display_name(identifier),
            },
        };
        Ok(self.repository.create_if_absent(identifier, &resolved).await?)
    }

    pub async fn get_profile(
        &self,
        identifier: &str,
    ) -> Result<LearnerProfile, ServiceError> {
        self.repository
            .find(identifier)
            .await?
            .ok_or_else(|| NotFoundError(normalize_identifier(identifier)).into())
    }

    /// Typed submission path: validate, normalize, reject near-identical
    /// resubmissions, persist.
    pub async fn try_submit_result(
        &self,
        identifier: &str,
        payload: &Value,
    ) -> Result<SubmissionReceipt, ServiceError> {
        let result = normalize::normalize_result(payload, self.clock.now())?;

        let profile = self.get_or_create(identifier, None).await?;
        self.reject_duplicate(&profile, &result)?;

        let updated = self
            .repository
            .append_result(&profile.identifier, result)
            .await?;
        let appended = updated
            .history
            .first()
            .ok_or_else(|| NotFoundError(profile.identifier.clone()))?;

        tracing::info!(
            identifier = %updated.identifier,
            sequence_number = appended.sequence_number,
            band = appended.scores.overall,
            tier = appended.difficulty_tier.as_str(),
            "submission accepted"
        );

        Ok(SubmissionReceipt {
            identifier: updated.identifier.clone(),
            display_name: updated.display_name.clone(),
            sequence_number: appended.sequence_number,
            overall_band: appended.scores.overall,
            tier: appended.difficulty_tier,
            total_completed: updated.summary.total_completed,
        })
    }

    /// Loose submission surface for the conversational layer: always a
    /// string, failures prefixed with "Error: ".
    pub async fn submit_result(&self, identifier: &str, payload: &Value) -> String {
        match self.try_submit_result(identifier, payload).await {
            Ok(receipt) => format!(
                "Test #{} recorded for {}: overall band {:.1}, {} tier. {} completed in total.",
                receipt.sequence_number,
                receipt.display_name,
                receipt.overall_band,
                receipt.tier.as_str(),
                receipt.total_completed,
            ),
            Err(err) => {
                tracing::warn!(identifier = %identifier, error = %err, "submission rejected");
                format!("Error: {err}")
            }
        }
    }

    /// Pick content for the learner's next session at their current tier,
    /// avoiding prompts from their recent completed results.
    pub async fn prepare_session(&self, identifier: &str) -> Result<SessionPlan, ServiceError> {
        let profile = self.get_or_create(identifier, None).await?;
        let tier = profile.summary.current_tier;
        let exclusions =
            PartExclusions::from_recent(&profile.history, self.settings.recent_exclusion_window);
        let question_set = select_question_set(&self.question_bank, tier, &exclusions)?;
        let session_id = uuid::Uuid::new_v4().to_string();

        tracing::info!(
            identifier = %profile.identifier,
            session_id = %session_id,
            tier = tier.as_str(),
            "session prepared"
        );

        let trend = analytics::trend(&profile.completed_scores(), self.settings.trend_window);
        Ok(SessionPlan {
            session_id,
            identifier: profile.identifier.clone(),
            tier,
            question_set,
            performance_summary: performance_summary(&profile, trend.direction),
        })
    }

    /// Full longitudinal report for an existing learner.
    pub async fn analytics(&self, identifier: &str) -> Result<AnalyticsReport, ServiceError> {
        let profile = self.get_profile(identifier).await?;
        Ok(analytics::report(
            &profile,
            self.settings.trend_window,
            self.settings.consistency_calibration,
        ))
    }

    /// Remove a learner and their whole history. Returns whether anything
    /// was deleted.
    pub async fn delete_learner(&self, identifier: &str) -> Result<bool, ServiceError> {
        Ok(self.repository.delete(identifier).await?)
    }

    // ========== Internals ==========

    /// A duplicate is any completed result in the trailing window with the
    /// same overall band and tier, not only the most recent one.
    fn reject_duplicate(
        &self,
        profile: &LearnerProfile,
        incoming: &TestResult,
    ) -> Result<(), DuplicateSubmissionError> {
        let now = self.clock.now();
        let cutoff =
            now - chrono::Duration::seconds(self.settings.duplicate_window.as_secs() as i64);

        for prior in profile.completed_since(cutoff) {
            if prior.scores.overall == incoming.scores.overall
                && prior.difficulty_tier == incoming.difficulty_tier
            {
                return Err(DuplicateSubmissionError {
                    identifier: profile.identifier.clone(),
                    band: incoming.scores.overall,
                    tier: incoming.difficulty_tier.as_str().to_string(),
                    seconds_ago: (now - prior.timestamp).num_seconds(),
                });
            }
        }
        Ok(())
    }
}

/// One-line recap for the start of a session, fed into the conversational
/// context.
fn performance_summary(profile: &LearnerProfile, trend: TrendDirection) -> String {
    let summary = &profile.summary;
    if summary.total_completed == 0 {
        return format!(
            "{} has no completed assessments yet; starting at the {} tier.",
            profile.display_name,
            summary.current_tier.as_str()
        );
    }

    let latest = summary
        .latest_score
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|| "-".to_string());
    let best = summary
        .best_score
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|| "-".to_string());
    let trend_text = match trend {
        TrendDirection::Improving => ", trending up",
        TrendDirection::Declining => ", trending down",
        TrendDirection::Stable => ", holding steady",
        TrendDirection::InsufficientData => "",
    };
    format!(
        "{}: {} completed assessments, latest band {}, best {}, {} tier{}.",
        profile.display_name,
        summary.total_completed,
        latest,
        best,
        summary.current_tier.as_str(),
        trend_text
    )
}
