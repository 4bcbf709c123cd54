use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::answer::{TestAnswer, TestFeedback, TestPart};
use crate::models::score::ProficiencyScore;

/// Difficulty tier a session's content is drawn from. Ordering follows
/// difficulty, easiest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Basic,
    Intermediate,
    Advanced,
}

impl DifficultyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Basic => "basic",
            DifficultyTier::Intermediate => "intermediate",
            DifficultyTier::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" | "beginner" => Some(DifficultyTier::Basic),
            "intermediate" => Some(DifficultyTier::Intermediate),
            "advanced" => Some(DifficultyTier::Advanced),
            _ => None,
        }
    }

    /// Tier implied by a latest overall band. Total over `Option<f64>`:
    /// no prior completed result lands in the middle tier. Boundary bands
    /// (4.5, 6.5) land on the softer tier.
    pub fn for_score(latest_overall: Option<f64>) -> Self {
        match latest_overall {
            None => DifficultyTier::Intermediate,
            Some(score) if score < 4.5 => DifficultyTier::Basic,
            Some(score) if score <= 6.5 => DifficultyTier::Intermediate,
            Some(_) => DifficultyTier::Advanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Completed,
    Cancelled,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Completed => "completed",
            TestStatus::Cancelled => "cancelled",
            TestStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "done" => Some(TestStatus::Completed),
            "cancelled" | "canceled" | "aborted" => Some(TestStatus::Cancelled),
            "error" | "failed" => Some(TestStatus::Error),
            _ => None,
        }
    }
}

/// One finished (or abandoned) assessment attempt. Append-only once
/// persisted; the repository assigns `sequence_number`, callers leave it 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub sequence_number: u32,
    pub timestamp: DateTime<Utc>,
    pub difficulty_tier: DifficultyTier,
    pub status: TestStatus,
    pub scores: ProficiencyScore,
    pub answers: BTreeMap<TestPart, TestAnswer>,
    pub feedback: TestFeedback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
}

impl TestResult {
    pub fn is_completed(&self) -> bool {
        self.status == TestStatus::Completed
    }

    /// Prompt texts the learner has already seen in this result, per part.
    pub fn prompts_for_part(&self, part: TestPart) -> Vec<&str> {
        self.answers
            .get(&part)
            .map(|answer| answer.prompts())
            .unwrap_or_default()
    }
}
