//! Alias tables for the loosely-typed payloads the agent layer produces.
//!
//! Every known alias maps to exactly one canonical key; unknown keys are
//! dropped by the caller, never errored. Lookup is case-insensitive and
//! treats spaces and dashes as underscores.

use crate::models::answer::TestPart;
use crate::models::score::ScoreCriterion;

fn fold_key(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

/// Resolve a score-map key to its criterion.
pub fn criterion_for_alias(key: &str) -> Option<ScoreCriterion> {
    match fold_key(key).as_str() {
        "fluency_coherence" | "fluency_and_coherence" | "fluency" | "coherence" => {
            Some(ScoreCriterion::FluencyCoherence)
        }
        "lexical_resource" | "lexical" | "vocabulary" | "vocab" => {
            Some(ScoreCriterion::LexicalResource)
        }
        "grammatical_range" | "grammatical_range_and_accuracy" | "grammar" | "grammatical" => {
            Some(ScoreCriterion::GrammaticalRange)
        }
        "pronunciation" | "pron" => Some(ScoreCriterion::Pronunciation),
        _ => None,
    }
}

/// Resolve an answers-map key to its part.
pub fn part_for_alias(key: &str) -> Option<TestPart> {
    match fold_key(key).as_str() {
        "part1" | "part_1" | "interview" => Some(TestPart::Interview),
        "part2" | "part_2" | "long_turn" | "cue_card" => Some(TestPart::LongTurn),
        "part3" | "part_3" | "discussion" | "two_way_discussion" => Some(TestPart::Discussion),
        _ => None,
    }
}

/// Keys under which the overall band may arrive, in lookup order.
pub const BAND_SCORE_KEYS: &[&str] = &["band_score", "overall", "overall_band", "score"];

/// Keys under which per-criterion score maps may arrive.
pub const SCORE_MAP_KEYS: &[&str] = &["scores", "detailed_scores", "criteria_scores"];

/// Keys under which the recorded-at timestamp may arrive.
pub const TIMESTAMP_KEYS: &[&str] = &["test_date", "timestamp", "date", "recorded_at"];

/// Keys under which the difficulty tier may arrive.
pub const TIER_KEYS: &[&str] = &["difficulty_tier", "difficulty", "tier", "level"];
