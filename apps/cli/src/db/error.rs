//! Database error types.

use scheduler_core::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("deck not found: {0}")]
    DeckNotFound(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<DbError> for SchedulerError {
    fn from(err: DbError) -> Self {
        SchedulerError::storage(err)
    }
}
