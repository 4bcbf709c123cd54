use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::score::ScoreCriterion;

/// The three parts of a speaking assessment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPart {
    Interview,
    LongTurn,
    Discussion,
}

impl TestPart {
    pub const ALL: [TestPart; 3] = [TestPart::Interview, TestPart::LongTurn, TestPart::Discussion];

    pub fn id(&self) -> &'static str {
        match self {
            TestPart::Interview => "part1",
            TestPart::LongTurn => "part2",
            TestPart::Discussion => "part3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestPart::Interview => "Part 1",
            TestPart::LongTurn => "Part 2",
            TestPart::Discussion => "Part 3",
        }
    }
}

/// What the learner actually said in one part.
///
/// Interview and discussion parts are question/response exchanges; the long
/// turn is a single topic with one extended response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestAnswer {
    Dialogue {
        questions: Vec<String>,
        responses: Vec<String>,
    },
    Monologue {
        topic: String,
        response: String,
    },
}

impl TestAnswer {
    pub fn is_empty(&self) -> bool {
        match self {
            TestAnswer::Dialogue { questions, responses } => {
                questions.is_empty() || responses.iter().all(|r| r.trim().is_empty())
            }
            TestAnswer::Monologue { response, .. } => response.trim().is_empty(),
        }
    }

    /// Question/topic texts used in this answer, for repeat exclusion.
    pub fn prompts(&self) -> Vec<&str> {
        match self {
            TestAnswer::Dialogue { questions, .. } => {
                questions.iter().map(String::as_str).collect()
            }
            TestAnswer::Monologue { topic, .. } => vec![topic.as_str()],
        }
    }

}

/// Examiner feedback attached to one result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFeedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub detailed_feedback: BTreeMap<ScoreCriterion, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TestFeedback {
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.improvements.is_empty()
            && self.detailed_feedback.is_empty()
            && self.notes.is_none()
    }
}
