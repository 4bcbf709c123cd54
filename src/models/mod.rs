pub mod answer;
pub mod learner;
pub mod result;
pub mod score;

pub use answer::{TestAnswer, TestFeedback, TestPart};
pub use learner::{normalize_identifier, LearnerProfile, ProfileSummary};
pub use result::{DifficultyTier, TestResult, TestStatus};
pub use score::{band_round, ProficiencyScore, ScoreCriterion};
