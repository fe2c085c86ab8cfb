use liftlog_db::StoreError;
use thiserror::Error;

/// Errors that can occur during training operations.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid date: {0}")]
    InvalidDate(String),
}
