pub mod meditations;
pub mod users;

pub use meditations::{MeditationRepository, RemovalDecision, RemovalOutcome};
pub use users::UserRepository;

use thiserror::Error;

use crate::db::StoreError;
use crate::models::ModelError;

/// Errors surfaced by repository operations. Store failures are caught at
/// this boundary and wrapped; they are never retried here.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ModelError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<mongodb::error::Error> for RepoError {
    fn from(err: mongodb::error::Error) -> Self {
        RepoError::Store(StoreError::Mongo(err))
    }
}

impl From<bson::ser::Error> for RepoError {
    fn from(err: bson::ser::Error) -> Self {
        RepoError::Store(StoreError::Encode(err))
    }
}

impl From<bson::de::Error> for RepoError {
    fn from(err: bson::de::Error) -> Self {
        RepoError::Store(StoreError::Decode(err))
    }
}
