pub mod clock;
pub mod directory;
pub mod learner;

pub use clock::{Clock, SystemClock};
pub use directory::{NullDirectory, UserDirectory};
pub use learner::{
    DuplicateSubmissionError, LearnerService, ServiceError, ServiceSettings, SessionPlan,
    SubmissionReceipt,
};
