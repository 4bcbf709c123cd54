use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::result::{DifficultyTier, TestResult};

/// Normalize a learner identifier for lookup: trimmed, ASCII-lowercased.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Summary fields derived from history. Always a pure function of the
/// history list; recomputed on every load and save, never set by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub total_completed: u32,
    pub cancelled_count: u32,
    pub latest_score: Option<f64>,
    pub best_score: Option<f64>,
    pub average_score: Option<f64>,
    pub current_tier: DifficultyTier,
}

impl ProfileSummary {
    /// `history` must be ordered newest-first.
    pub fn from_history(history: &[TestResult], default_tier: DifficultyTier) -> Self {
        let completed: Vec<&TestResult> = history.iter().filter(|r| r.is_completed()).collect();
        let total_completed = completed.len() as u32;
        let cancelled_count = history.len() as u32 - total_completed;

        let latest_score = completed.first().map(|r| r.scores.overall);
        let best_score = completed
            .iter()
            .map(|r| r.scores.overall)
            .fold(None, |best: Option<f64>, score| match best {
                Some(b) if b >= score => Some(b),
                _ => Some(score),
            });
        let average_score = if completed.is_empty() {
            None
        } else {
            let sum: f64 = completed.iter().map(|r| r.scores.overall).sum();
            Some((sum / completed.len() as f64 * 10.0).round() / 10.0)
        };

        let current_tier = if latest_score.is_some() {
            DifficultyTier::for_score(latest_score)
        } else {
            default_tier
        };

        Self {
            total_completed,
            cancelled_count,
            latest_score,
            best_score,
            average_score,
            current_tier,
        }
    }
}

/// A learner with their full assessment history, newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub identifier: String,
    pub display_name: String,
    pub history: Vec<TestResult>,
    pub summary: ProfileSummary,
}

impl LearnerProfile {
    pub fn new(identifier: &str, display_name: &str, default_tier: DifficultyTier) -> Self {
        Self {
            identifier: normalize_identifier(identifier),
            display_name: display_name.to_string(),
            history: Vec::new(),
            summary: ProfileSummary::from_history(&[], default_tier),
        }
    }

    pub fn recompute_summary(&mut self, default_tier: DifficultyTier) {
        self.summary = ProfileSummary::from_history(&self.history, default_tier);
    }

    /// Overall bands of completed results, newest-first.
    pub fn completed_scores(&self) -> Vec<f64> {
        self.history
            .iter()
            .filter(|r| r.is_completed())
            .map(|r| r.scores.overall)
            .collect()
    }

    pub fn latest_completed(&self) -> Option<&TestResult> {
        self.history.iter().find(|r| r.is_completed())
    }

    /// Completed results recorded at or after `since`, newest-first.
    pub fn completed_since(&self, since: DateTime<Utc>) -> Vec<&TestResult> {
        self.history
            .iter()
            .filter(|r| r.is_completed() && r.timestamp >= since)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;

    use super::*;
    use crate::models::answer::TestFeedback;
    use crate::models::result::TestStatus;
    use crate::models::score::ProficiencyScore;

    fn result(seq: u32, overall_parts: (f64, f64, f64, f64), status: TestStatus) -> TestResult {
        TestResult {
            sequence_number: seq,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
                + chrono::Duration::hours(seq as i64),
            difficulty_tier: DifficultyTier::Intermediate,
            status,
            scores: ProficiencyScore::from_criteria(
                overall_parts.0,
                overall_parts.1,
                overall_parts.2,
                overall_parts.3,
            ),
            answers: BTreeMap::new(),
            feedback: TestFeedback::default(),
            session_id: None,
            duration_minutes: None,
        }
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn test_summary_empty_history_uses_default_tier() {
        let summary = ProfileSummary::from_history(&[], DifficultyTier::Basic);
        assert_eq!(summary.total_completed, 0);
        assert_eq!(summary.latest_score, None);
        assert_eq!(summary.best_score, None);
        assert_eq!(summary.average_score, None);
        assert_eq!(summary.current_tier, DifficultyTier::Basic);
    }

    #[test]
    fn test_summary_only_counts_completed() {
        // Newest-first: a cancelled attempt on top must not drive the tier.
        let history = vec![
            result(3, (4.0, 4.0, 4.0, 4.0), TestStatus::Cancelled),
            result(2, (7.0, 7.0, 7.0, 7.0), TestStatus::Completed),
            result(1, (6.0, 6.0, 6.0, 6.0), TestStatus::Completed),
        ];
        let summary = ProfileSummary::from_history(&history, DifficultyTier::Intermediate);
        assert_eq!(summary.total_completed, 2);
        assert_eq!(summary.cancelled_count, 1);
        assert_eq!(summary.latest_score, Some(7.0));
        assert_eq!(summary.best_score, Some(7.0));
        assert_eq!(summary.average_score, Some(6.5));
        assert_eq!(summary.current_tier, DifficultyTier::Advanced);
    }

    #[test]
    fn test_recompute_summary_after_append() {
        let mut profile = LearnerProfile::new("A@x.com", "Ada", DifficultyTier::Intermediate);
        assert_eq!(profile.identifier, "a@x.com");

        profile
            .history
            .insert(0, result(1, (4.0, 4.0, 4.0, 4.0), TestStatus::Completed));
        profile.recompute_summary(DifficultyTier::Intermediate);
        assert_eq!(profile.summary.total_completed, 1);
        assert_eq!(profile.summary.latest_score, Some(4.0));
        assert_eq!(profile.summary.current_tier, DifficultyTier::Basic);
    }
}
