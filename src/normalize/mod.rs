//! Bidirectional normalization between the loosely-structured result
//! payloads the agent layer produces (canonical or legacy key sets) and the
//! canonical [`TestResult`] model, plus the stable stored entry shape the
//! repository persists.
//!
//! Pure transforms: either a complete `TestResult` comes back or a
//! [`ValidationError`] does, never a partially populated result.

pub mod aliases;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::answer::{TestAnswer, TestFeedback, TestPart};
use crate::models::result::{DifficultyTier, TestResult, TestStatus};
use crate::models::score::{is_valid_band, ProficiencyScore, ScoreCriterion};
use crate::normalize::aliases::{
    criterion_for_alias, part_for_alias, BAND_SCORE_KEYS, SCORE_MAP_KEYS, TIER_KEYS,
    TIMESTAMP_KEYS,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field '{field}' is not a numeric score (got {value})")]
    NonNumericScore { field: String, value: String },
    #[error("field '{field}' is outside the 0..=9 band range (got {value})")]
    ScoreOutOfRange { field: String, value: f64 },
    #[error("no non-empty answer content in any part")]
    NoContent,
}

/// Which key family the payload used. Detected once up front instead of
/// probing keys throughout the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawShape {
    /// `scores` object with canonical criterion names.
    Canonical,
    /// `detailed_scores` + flat per-criterion feedback, the stored/legacy
    /// family.
    Legacy,
}

pub fn detect_shape(payload: &Map<String, Value>) -> RawShape {
    if payload.get("scores").map(Value::is_object).unwrap_or(false) {
        RawShape::Canonical
    } else {
        RawShape::Legacy
    }
}

/// Convert a raw submission payload into a canonical result.
///
/// `recorded_at` is used when the payload carries no usable timestamp.
/// `sequence_number` is left at 0; the repository assigns it on append.
pub fn normalize_result(
    payload: &Value,
    recorded_at: DateTime<Utc>,
) -> Result<TestResult, ValidationError> {
    let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    let shape = detect_shape(obj);

    let scores = extract_scores(obj, shape)?;
    let answers = extract_answers(obj);
    if answers.values().all(TestAnswer::is_empty) {
        return Err(ValidationError::NoContent);
    }
    let feedback = extract_feedback(obj);

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .and_then(TestStatus::parse)
        .unwrap_or(TestStatus::Completed);

    let difficulty_tier = first_key(obj, TIER_KEYS)
        .and_then(Value::as_str)
        .and_then(DifficultyTier::parse)
        .unwrap_or(DifficultyTier::Intermediate);

    let timestamp = first_key(obj, TIMESTAMP_KEYS)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or(recorded_at);

    let session_id = obj
        .get("session_id")
        .or_else(|| obj.get("sessionId"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let duration_minutes = obj
        .get("duration_minutes")
        .or_else(|| obj.get("duration"))
        .and_then(Value::as_f64);

    Ok(TestResult {
        sequence_number: 0,
        timestamp,
        difficulty_tier,
        status,
        scores,
        answers,
        feedback,
        session_id,
        duration_minutes,
    })
}

/// Read one persisted history entry, tolerating both the canonical written
/// shape and older stored variants.
pub fn from_stored(entry: &Value) -> Result<TestResult, ValidationError> {
    let mut result = normalize_result(entry, DateTime::<Utc>::UNIX_EPOCH)?;
    result.sequence_number = entry
        .get("test_number")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    Ok(result)
}

/// Serialize a canonical result into the stable stored entry shape.
pub fn to_stored(result: &TestResult) -> Value {
    let mut answers = Map::new();
    for (part, answer) in &result.answers {
        answers.insert(part.label().to_string(), stored_answer(answer));
    }

    let mut detailed_scores = Map::new();
    for criterion in ScoreCriterion::ALL {
        detailed_scores.insert(
            criterion.key().to_string(),
            json!(result.scores.get(criterion)),
        );
    }

    let mut feedback = Map::new();
    for (criterion, text) in &result.feedback.detailed_feedback {
        feedback.insert(criterion.key().to_string(), json!(text));
    }

    let mut entry = Map::new();
    entry.insert("answers".into(), Value::Object(answers));
    entry.insert("detailed_scores".into(), Value::Object(detailed_scores));
    entry.insert("band_score".into(), json!(result.scores.overall));
    entry.insert("feedback".into(), Value::Object(feedback));
    entry.insert("strengths".into(), json!(result.feedback.strengths));
    entry.insert("improvements".into(), json!(result.feedback.improvements));
    if let Some(notes) = &result.feedback.notes {
        entry.insert("notes".into(), json!(notes));
    }
    entry.insert("test_number".into(), json!(result.sequence_number));
    entry.insert("test_date".into(), json!(result.timestamp.to_rfc3339()));
    entry.insert("status".into(), json!(result.status.as_str()));
    entry.insert("difficulty".into(), json!(result.difficulty_tier.as_str()));
    if let Some(session_id) = &result.session_id {
        entry.insert("session_id".into(), json!(session_id));
    }
    if let Some(duration) = result.duration_minutes {
        entry.insert("duration_minutes".into(), json!(duration));
    }
    Value::Object(entry)
}

// ========== Scores ==========

fn extract_scores(
    obj: &Map<String, Value>,
    shape: RawShape,
) -> Result<ProficiencyScore, ValidationError> {
    let score_map = match shape {
        RawShape::Canonical => obj.get("scores").and_then(Value::as_object),
        RawShape::Legacy => SCORE_MAP_KEYS
            .iter()
            .filter(|key| **key != "scores")
            .find_map(|key| obj.get(*key).and_then(Value::as_object)),
    };

    let mut criteria: BTreeMap<ScoreCriterion, f64> = BTreeMap::new();
    if let Some(map) = score_map {
        for (key, value) in map {
            let Some(criterion) = criterion_for_alias(key) else {
                // Band-score aliases inside the map are handled below;
                // anything else is dropped.
                continue;
            };
            let band = band_value(key, value)?;
            criteria.insert(criterion, band);
        }
    }

    let supplied_band = find_band_score(obj, score_map)?;

    // Missing criteria fall back to the supplied overall band.
    for criterion in ScoreCriterion::ALL {
        if !criteria.contains_key(&criterion) {
            tracing::debug!(
                criterion = criterion.key(),
                "criterion score absent, defaulting to band score"
            );
            criteria.insert(criterion, supplied_band);
        }
    }

    let scores = ProficiencyScore::from_criteria(
        criteria[&ScoreCriterion::FluencyCoherence],
        criteria[&ScoreCriterion::LexicalResource],
        criteria[&ScoreCriterion::GrammaticalRange],
        criteria[&ScoreCriterion::Pronunciation],
    );

    if (supplied_band - scores.overall).abs() > 0.5 {
        tracing::warn!(
            supplied = supplied_band,
            recomputed = scores.overall,
            "supplied overall band disagrees with criterion mean, recomputed value wins"
        );
    }

    Ok(scores)
}

fn find_band_score(
    obj: &Map<String, Value>,
    score_map: Option<&Map<String, Value>>,
) -> Result<f64, ValidationError> {
    for key in BAND_SCORE_KEYS {
        if let Some(value) = obj.get(*key) {
            return band_value(key, value);
        }
        if let Some(value) = score_map.and_then(|m| m.get(*key)) {
            return band_value(key, value);
        }
    }
    Err(ValidationError::MissingField("band_score"))
}

fn band_value(field: &str, value: &Value) -> Result<f64, ValidationError> {
    let number = value
        .as_f64()
        .ok_or_else(|| ValidationError::NonNumericScore {
            field: field.to_string(),
            value: value.to_string(),
        })?;
    if !is_valid_band(number) {
        return Err(ValidationError::ScoreOutOfRange {
            field: field.to_string(),
            value: number,
        });
    }
    Ok(number)
}

// ========== Answers ==========

fn extract_answers(obj: &Map<String, Value>) -> BTreeMap<TestPart, TestAnswer> {
    let mut answers = BTreeMap::new();
    let Some(raw) = obj.get("answers").and_then(Value::as_object) else {
        return answers;
    };

    for (key, value) in raw {
        let Some(part) = part_for_alias(key) else {
            tracing::debug!(key, "unrecognized answers key dropped");
            continue;
        };
        let Some(entry) = value.as_object() else {
            tracing::warn!(part = part.id(), "answer entry is not an object, dropped");
            continue;
        };
        if let Some(answer) = parse_answer(part, entry) {
            answers.insert(part, answer);
        }
    }
    answers
}

fn parse_answer(part: TestPart, entry: &Map<String, Value>) -> Option<TestAnswer> {
    let topic = entry
        .get("topic")
        .or_else(|| entry.get("prompt"))
        .and_then(Value::as_str);
    let has_dialogue_keys = entry.contains_key("questions") || entry.contains_key("responses");

    if topic.is_some() || (!has_dialogue_keys && entry.contains_key("response")) {
        let response = entry
            .get("response")
            .or_else(|| entry.get("answer"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Some(TestAnswer::Monologue {
            topic: topic.unwrap_or_default().to_string(),
            response: response.to_string(),
        });
    }

    if has_dialogue_keys {
        let questions = string_array(entry.get("questions"));
        let responses = string_array(entry.get("responses").or_else(|| entry.get("answers")));
        if questions.len() != responses.len() {
            tracing::warn!(
                part = part.id(),
                questions = questions.len(),
                responses = responses.len(),
                "question/response count mismatch, pairing truncates to the shorter list"
            );
        }
        return Some(TestAnswer::Dialogue { questions, responses });
    }

    tracing::debug!(part = part.id(), "answer entry has no recognized content keys");
    None
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ========== Feedback ==========

const COMBINED_FEEDBACK_KEYS: &[&str] = &[
    "strengths",
    "improvements",
    "detailed_feedback",
    "detailedFeedback",
    "notes",
];

fn extract_feedback(obj: &Map<String, Value>) -> TestFeedback {
    let mut feedback = TestFeedback::default();

    if let Some(raw) = obj.get("feedback") {
        match raw {
            Value::Object(map) => {
                let combined = COMBINED_FEEDBACK_KEYS.iter().any(|k| map.contains_key(*k));
                if combined {
                    feedback.strengths = string_array(map.get("strengths"));
                    feedback.improvements = string_array(map.get("improvements"));
                    let detailed = map
                        .get("detailed_feedback")
                        .or_else(|| map.get("detailedFeedback"))
                        .and_then(Value::as_object);
                    if let Some(detailed) = detailed {
                        merge_criterion_texts(&mut feedback.detailed_feedback, detailed);
                    }
                    feedback.notes = map.get("notes").and_then(Value::as_str).map(str::to_string);
                } else {
                    merge_criterion_texts(&mut feedback.detailed_feedback, map);
                }
            }
            Value::String(text) => feedback.notes = Some(text.clone()),
            _ => {}
        }
    }

    // Root-level arrays and notes merge in (the legacy stored shape keeps
    // them beside the per-criterion map).
    merge_strings(&mut feedback.strengths, string_array(obj.get("strengths")));
    merge_strings(
        &mut feedback.improvements,
        string_array(obj.get("improvements")),
    );
    if feedback.notes.is_none() {
        feedback.notes = obj.get("notes").and_then(Value::as_str).map(str::to_string);
    }

    feedback
}

fn merge_criterion_texts(
    target: &mut BTreeMap<ScoreCriterion, String>,
    map: &Map<String, Value>,
) {
    for (key, value) in map {
        let Some(criterion) = criterion_for_alias(key) else {
            continue;
        };
        if let Some(text) = value.as_str() {
            target.entry(criterion).or_insert_with(|| text.to_string());
        }
    }
}

fn merge_strings(target: &mut Vec<String>, extra: Vec<String>) {
    for item in extra {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

// ========== Helpers ==========

fn first_key<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn stored_answer(answer: &TestAnswer) -> Value {
    match answer {
        TestAnswer::Dialogue { questions, responses } => json!({
            "questions": questions,
            "responses": responses,
        }),
        TestAnswer::Monologue { topic, response } => json!({
            "topic": topic,
            "response": response,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded_at() -> DateTime<Utc> {
        "2026-03-10T09:00:00Z".parse().unwrap()
    }

    fn legacy_payload() -> Value {
        json!({
            "detailed_scores": {
                "fluency": 6.0,
                "grammar": 6.0,
                "vocab": 7.0,
                "pronunciation": 7.0
            },
            "band_score": 6.5,
            "answers": {
                "Part 1": {
                    "questions": ["Where do you live?", "Do you work or study?"],
                    "responses": ["I live in Leipzig.", "I study biology."]
                },
                "Part 2": {
                    "topic": "Describe a journey you remember",
                    "response": "Two years ago I took a night train..."
                }
            },
            "feedback": {
                "fluency": "Good pace, occasional hesitation.",
                "grammar": "Article errors under pressure."
            },
            "strengths": ["wide topic vocabulary"],
            "improvements": ["article usage"],
            "test_date": "2026-03-09T18:30:00Z"
        })
    }

    fn canonical_payload() -> Value {
        json!({
            "scores": {
                "fluency_coherence": 5.0,
                "lexical_resource": 5.5,
                "grammatical_range": 5.0,
                "pronunciation": 6.0,
                "overall": 5.5
            },
            "answers": {
                "part3": {
                    "questions": ["How has travel changed?"],
                    "responses": ["People fly much more than before..."]
                }
            },
            "feedback": {
                "strengths": ["clear opinions"],
                "improvements": ["longer answers"],
                "detailed_feedback": { "pronunciation": "Clear vowels." },
                "notes": "Short but relevant turns."
            },
            "status": "completed",
            "difficulty": "intermediate",
            "session_id": "s-42",
            "duration_minutes": 12.5
        })
    }

    #[test]
    fn test_legacy_payload_normalizes() {
        let result = normalize_result(&legacy_payload(), recorded_at()).unwrap();
        assert_eq!(result.scores.overall, 6.5);
        assert_eq!(result.scores.lexical_resource, 7.0);
        assert_eq!(result.status, TestStatus::Completed);
        assert_eq!(result.sequence_number, 0);
        assert_eq!(result.answers.len(), 2);
        assert_eq!(
            result.timestamp,
            "2026-03-09T18:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(result.feedback.strengths, vec!["wide topic vocabulary"]);
        assert_eq!(
            result.feedback.detailed_feedback[&ScoreCriterion::FluencyCoherence],
            "Good pace, occasional hesitation."
        );
    }

    #[test]
    fn test_canonical_payload_normalizes() {
        let result = normalize_result(&canonical_payload(), recorded_at()).unwrap();
        assert_eq!(result.scores.overall, 5.5);
        assert_eq!(result.session_id.as_deref(), Some("s-42"));
        assert_eq!(result.duration_minutes, Some(12.5));
        assert_eq!(result.feedback.notes.as_deref(), Some("Short but relevant turns."));
        assert_eq!(
            result.feedback.detailed_feedback[&ScoreCriterion::Pronunciation],
            "Clear vowels."
        );
        // Payload without a date falls back to the caller's timestamp.
        assert_eq!(result.timestamp, recorded_at());
    }

    #[test]
    fn test_shape_detection() {
        assert_eq!(
            detect_shape(canonical_payload().as_object().unwrap()),
            RawShape::Canonical
        );
        assert_eq!(
            detect_shape(legacy_payload().as_object().unwrap()),
            RawShape::Legacy
        );
    }

    #[test]
    fn test_missing_band_score_fails() {
        let payload = json!({
            "answers": { "Part 2": { "topic": "t", "response": "something said" } }
        });
        let err = normalize_result(&payload, recorded_at()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("band_score"));
    }

    #[test]
    fn test_non_numeric_score_fails() {
        let mut payload = legacy_payload();
        payload["detailed_scores"]["grammar"] = json!("six");
        let err = normalize_result(&payload, recorded_at()).unwrap_err();
        assert!(matches!(err, ValidationError::NonNumericScore { field, .. } if field == "grammar"));
    }

    #[test]
    fn test_out_of_range_score_fails() {
        let mut payload = legacy_payload();
        payload["band_score"] = json!(9.5);
        let err = normalize_result(&payload, recorded_at()).unwrap_err();
        assert!(matches!(err, ValidationError::ScoreOutOfRange { .. }));
    }

    #[test]
    fn test_empty_answers_fail() {
        let payload = json!({
            "band_score": 6.0,
            "answers": { "Part 2": { "topic": "t", "response": "  " } }
        });
        assert_eq!(
            normalize_result(&payload, recorded_at()).unwrap_err(),
            ValidationError::NoContent
        );
    }

    #[test]
    fn test_missing_criteria_default_to_band() {
        let payload = json!({
            "band_score": 6.0,
            "answers": { "Part 2": { "topic": "t", "response": "spoken at length" } }
        });
        let result = normalize_result(&payload, recorded_at()).unwrap();
        assert_eq!(result.scores.fluency_coherence, 6.0);
        assert_eq!(result.scores.overall, 6.0);
    }

    #[test]
    fn test_unknown_keys_dropped_not_errored() {
        let mut payload = legacy_payload();
        payload["detailed_scores"]["spelling"] = json!(3.0);
        payload["answers"]["Part 9"] = json!({"questions": [], "responses": []});
        let result = normalize_result(&payload, recorded_at()).unwrap();
        assert_eq!(result.scores.overall, 6.5);
        assert_eq!(result.answers.len(), 2);
    }

    #[test]
    fn test_stored_round_trip_is_idempotent() {
        let first = normalize_result(&legacy_payload(), recorded_at()).unwrap();
        let stored = to_stored(&first);
        let second = from_stored(&stored).unwrap();
        assert_eq!(first, second);

        // And once more through the stored form.
        let third = from_stored(&to_stored(&second)).unwrap();
        assert_eq!(second, third);
    }

    #[test]
    fn test_from_stored_recovers_sequence_number() {
        let mut result = normalize_result(&legacy_payload(), recorded_at()).unwrap();
        result.sequence_number = 7;
        let reread = from_stored(&to_stored(&result)).unwrap();
        assert_eq!(reread.sequence_number, 7);
    }
}
