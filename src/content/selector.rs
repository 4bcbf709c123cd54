//! Exclusion-aware draw of one question set per session.
//!
//! Exclusions come from the content a learner actually saw in their recent
//! completed results. A part whose filtered pool comes up empty falls back
//! to the unfiltered pool for that part only; a session is never blocked
//! for lack of fresh content.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::content::{ContentPoolError, QuestionBank, QuestionSet};
use crate::models::answer::TestPart;
use crate::models::result::{DifficultyTier, TestResult};

/// Prompt texts the learner has recently seen, per part.
#[derive(Debug, Clone, Default)]
pub struct PartExclusions {
    pub interview: HashSet<String>,
    pub long_turn: HashSet<String>,
    pub discussion: HashSet<String>,
}

impl PartExclusions {
    /// Build exclusions from the `window` most recent completed results
    /// (`history` ordered newest-first).
    pub fn from_recent(history: &[TestResult], window: usize) -> Self {
        let mut exclusions = Self::default();
        for result in history.iter().filter(|r| r.is_completed()).take(window) {
            for (part, target) in [
                (TestPart::Interview, &mut exclusions.interview),
                (TestPart::LongTurn, &mut exclusions.long_turn),
                (TestPart::Discussion, &mut exclusions.discussion),
            ] {
                for prompt in result.prompts_for_part(part) {
                    target.insert(prompt.to_string());
                }
            }
        }
        exclusions
    }

    fn for_part(&self, part: TestPart) -> &HashSet<String> {
        match part {
            TestPart::Interview => &self.interview,
            TestPart::LongTurn => &self.long_turn,
            TestPart::Discussion => &self.discussion,
        }
    }
}

/// Draw one question set for `tier`, avoiding recently seen prompts.
pub fn select_question_set(
    bank: &QuestionBank,
    tier: DifficultyTier,
    exclusions: &PartExclusions,
) -> Result<QuestionSet, ContentPoolError> {
    select_question_set_with_rng(bank, tier, exclusions, &mut rand::rng())
}

pub fn select_question_set_with_rng<R: Rng + ?Sized>(
    bank: &QuestionBank,
    tier: DifficultyTier,
    exclusions: &PartExclusions,
    rng: &mut R,
) -> Result<QuestionSet, ContentPoolError> {
    let pool = bank.tier(tier);
    if let Some(part) = pool.empty_part() {
        return Err(ContentPoolError::EmptyPool { tier, part });
    }

    let interview = draw(
        &pool.interview,
        |q| &q.question,
        exclusions.for_part(TestPart::Interview),
        tier,
        TestPart::Interview,
        rng,
    );
    let long_turn = draw(
        &pool.long_turn,
        |t| &t.topic,
        exclusions.for_part(TestPart::LongTurn),
        tier,
        TestPart::LongTurn,
        rng,
    );
    let discussion = draw(
        &pool.discussion,
        |q| &q.question,
        exclusions.for_part(TestPart::Discussion),
        tier,
        TestPart::Discussion,
        rng,
    );

    Ok(QuestionSet {
        tier,
        interview,
        long_turn,
        discussion,
    })
}

fn draw<T: Clone, R: Rng + ?Sized>(
    pool: &[T],
    prompt_of: impl Fn(&T) -> &String,
    excluded: &HashSet<String>,
    tier: DifficultyTier,
    part: TestPart,
    rng: &mut R,
) -> T {
    let fresh: Vec<&T> = pool
        .iter()
        .filter(|item| !excluded.contains(prompt_of(item)))
        .collect();

    if fresh.is_empty() {
        tracing::warn!(
            tier = tier.as_str(),
            part = part.id(),
            pool_size = pool.len(),
            "exclusion emptied the pool, falling back to the full pool"
        );
        // Unfiltered fallback; `select_question_set_with_rng` already
        // rejected genuinely empty pools.
        return pool.choose(rng).cloned().expect("pool checked non-empty");
    }

    (*fresh.choose(rng).expect("fresh checked non-empty")).clone()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::models::answer::{TestAnswer, TestFeedback};
    use crate::models::result::TestStatus;
    use crate::models::score::ProficiencyScore;

    fn result_with_prompts(topic: &str, interview_q: &str, status: TestStatus) -> TestResult {
        let mut answers = BTreeMap::new();
        answers.insert(
            TestPart::Interview,
            TestAnswer::Dialogue {
                questions: vec![interview_q.to_string()],
                responses: vec!["an answer".to_string()],
            },
        );
        answers.insert(
            TestPart::LongTurn,
            TestAnswer::Monologue {
                topic: topic.to_string(),
                response: "a long answer".to_string(),
            },
        );
        TestResult {
            sequence_number: 1,
            timestamp: Utc::now(),
            difficulty_tier: DifficultyTier::Intermediate,
            status,
            scores: ProficiencyScore::from_criteria(6.0, 6.0, 6.0, 6.0),
            answers,
            feedback: TestFeedback::default(),
            session_id: None,
            duration_minutes: None,
        }
    }

    #[test]
    fn test_exclusions_collect_recent_prompts_only_from_completed() {
        let history = vec![
            result_with_prompts("topic-cancelled", "q-cancelled", TestStatus::Cancelled),
            result_with_prompts("topic-a", "q-a", TestStatus::Completed),
            result_with_prompts("topic-b", "q-b", TestStatus::Completed),
        ];
        let exclusions = PartExclusions::from_recent(&history, 3);
        assert!(exclusions.long_turn.contains("topic-a"));
        assert!(exclusions.long_turn.contains("topic-b"));
        assert!(!exclusions.long_turn.contains("topic-cancelled"));
        assert!(exclusions.interview.contains("q-a"));
    }

    #[test]
    fn test_exclusion_window_is_bounded() {
        let history: Vec<TestResult> = (0..10)
            .map(|i| {
                result_with_prompts(&format!("topic-{i}"), &format!("q-{i}"), TestStatus::Completed)
            })
            .collect();
        let exclusions = PartExclusions::from_recent(&history, 3);
        assert_eq!(exclusions.long_turn.len(), 3);
        assert!(exclusions.long_turn.contains("topic-0"));
        assert!(!exclusions.long_turn.contains("topic-5"));
    }

    #[test]
    fn test_selection_avoids_excluded_prompts() {
        let bank = QuestionBank::built_in();
        let pool = bank.tier(DifficultyTier::Intermediate);

        // Exclude every long-turn topic except one; that one must be drawn.
        let keep = pool.long_turn[0].topic.clone();
        let mut exclusions = PartExclusions::default();
        for item in pool.long_turn.iter().skip(1) {
            exclusions.long_turn.insert(item.topic.clone());
        }

        for _ in 0..20 {
            let set =
                select_question_set(&bank, DifficultyTier::Intermediate, &exclusions).unwrap();
            assert_eq!(set.long_turn.topic, keep);
        }
    }

    #[test]
    fn test_fully_excluded_part_falls_back_to_full_pool() {
        let bank = QuestionBank::built_in();
        let pool = bank.tier(DifficultyTier::Basic);

        let mut exclusions = PartExclusions::default();
        for item in &pool.interview {
            exclusions.interview.insert(item.question.clone());
        }

        let set = select_question_set(&bank, DifficultyTier::Basic, &exclusions).unwrap();
        assert!(pool
            .interview
            .iter()
            .any(|q| q.question == set.interview.question));
    }

    #[test]
    fn test_empty_tier_pool_errors() {
        let mut bank = QuestionBank::built_in();
        bank.basic.discussion.clear();
        let err = select_question_set(&bank, DifficultyTier::Basic, &PartExclusions::default())
            .unwrap_err();
        assert!(matches!(err, ContentPoolError::EmptyPool { .. }));
    }
}
