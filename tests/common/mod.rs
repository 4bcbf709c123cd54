use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use speaktrack_backend::content::QuestionBank;
use speaktrack_backend::db::memory::MemoryLearnerStore;
use speaktrack_backend::repository::{LearnerRepository, RepositorySettings};
use speaktrack_backend::services::clock::Clock;
use speaktrack_backend::services::directory::NullDirectory;
use speaktrack_backend::services::{LearnerService, ServiceSettings};

/// Deterministic clock shared between the test and the service under test.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()),
        })
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Fully wired service over in-memory storage and the built-in bank.
pub fn test_service() -> (LearnerService, Arc<TestClock>) {
    let clock = TestClock::new();
    let repository = LearnerRepository::new(
        Arc::new(MemoryLearnerStore::new()),
        RepositorySettings::default(),
    );
    let service = LearnerService::new(
        repository,
        Arc::new(QuestionBank::built_in()),
        Arc::new(NullDirectory),
        clock.clone(),
        ServiceSettings::default(),
    );
    (service, clock)
}

/// Legacy-shaped submission payload with per-criterion bands.
pub fn legacy_payload(fluency: f64, vocab: f64, grammar: f64, pronunciation: f64) -> Value {
    json!({
        "detailed_scores": {
            "fluency": fluency,
            "vocab": vocab,
            "grammar": grammar,
            "pronunciation": pronunciation
        },
        "band_score": ((fluency + vocab + grammar + pronunciation) / 4.0 * 2.0).round() / 2.0,
        "answers": {
            "Part 1": {
                "questions": ["Where do you live?"],
                "responses": ["I live in a small town near the coast."]
            },
            "Part 2": {
                "topic": "Describe a journey you remember",
                "response": "Two years ago I took a night train across the country..."
            }
        },
        "strengths": ["natural pacing"],
        "improvements": ["article usage"]
    })
}
