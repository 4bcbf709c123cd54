//! Question content: the per-tier pools sessions draw from, plus the
//! exclusion-aware selector. The bank is read-only after load and shared
//! across concurrent selections.

pub mod bank;
pub mod selector;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::answer::TestPart;
use crate::models::result::DifficultyTier;

pub use selector::{select_question_set, select_question_set_with_rng, PartExclusions};

/// An interview- or discussion-part question with its pre-authored
/// follow-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptedQuestion {
    pub question: String,
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

/// A long-turn cue card: topic plus the points the learner should cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTurnTopic {
    pub topic: String,
    #[serde(default)]
    pub bullet_points: Vec<String>,
}

/// Question lists for one tier, one list per part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPool {
    #[serde(default)]
    pub interview: Vec<PromptedQuestion>,
    #[serde(default)]
    pub long_turn: Vec<LongTurnTopic>,
    #[serde(default)]
    pub discussion: Vec<PromptedQuestion>,
}

impl TierPool {
    /// Which part, if any, has no content at all.
    pub fn empty_part(&self) -> Option<TestPart> {
        if self.interview.is_empty() {
            Some(TestPart::Interview)
        } else if self.long_turn.is_empty() {
            Some(TestPart::LongTurn)
        } else if self.discussion.is_empty() {
            Some(TestPart::Discussion)
        } else {
            None
        }
    }
}

/// The full content pool, keyed by tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBank {
    pub basic: TierPool,
    pub intermediate: TierPool,
    pub advanced: TierPool,
}

impl QuestionBank {
    pub fn tier(&self, tier: DifficultyTier) -> &TierPool {
        match tier {
            DifficultyTier::Basic => &self.basic,
            DifficultyTier::Intermediate => &self.intermediate,
            DifficultyTier::Advanced => &self.advanced,
        }
    }

    /// Compiled-in bank; keeps the system useful with zero configuration.
    pub fn built_in() -> Self {
        bank::built_in()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ContentPoolError> {
        let bank: QuestionBank =
            serde_json::from_str(raw).map_err(|e| ContentPoolError::Load(e.to_string()))?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn from_json_file(path: &str) -> Result<Self, ContentPoolError> {
        let raw =
            std::fs::read_to_string(path).map_err(|e| ContentPoolError::Load(e.to_string()))?;
        Self::from_json_str(&raw)
    }

    /// A tier with an empty part list is a configuration defect, not
    /// something selection should paper over.
    pub fn validate(&self) -> Result<(), ContentPoolError> {
        for tier in [
            DifficultyTier::Basic,
            DifficultyTier::Intermediate,
            DifficultyTier::Advanced,
        ] {
            if let Some(part) = self.tier(tier).empty_part() {
                return Err(ContentPoolError::EmptyPool { tier, part });
            }
        }
        Ok(())
    }
}

/// One session's worth of content: one item per part, drawn independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub tier: DifficultyTier,
    pub interview: PromptedQuestion,
    pub long_turn: LongTurnTopic,
    pub discussion: PromptedQuestion,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentPoolError {
    #[error("content pool for tier '{}' has no items for {}", tier.as_str(), part.label())]
    EmptyPool {
        tier: DifficultyTier,
        part: TestPart,
    },
    #[error("failed to load question bank: {0}")]
    Load(String),
}
