pub mod meditation;
pub mod user;

pub use meditation::{
    Category, MeditationDoc, MeditationPatch, MeditationSummary, MEDITATION_COLLECTION,
    RECOMMENDED_KINDS,
};
pub use user::{
    Address, AssessmentKind, AssessmentResult, HistoryEntry, MoodEntry, Notification, UserDoc,
    UserPatch, UserSummary, USER_COLLECTION,
};

use thiserror::Error;

/// Validation failures raised before anything touches the store
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("mood level must be between 1 and 5, got {0}")]
    MoodLevelOutOfRange(i32),

    #[error("duration must be a positive number of minutes, got {0}")]
    NonPositiveDuration(i64),

    #[error("unknown meditation category: '{0}'")]
    UnknownCategory(String),
}
