//! Error types for the analysis pipeline

use thiserror::Error;

/// Errors that can occur while loading a session log or scoring it
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid half-life {0:?}: expected a positive number of days or 'auto'")]
    InvalidHalfLife(String),

    #[error("invalid recent window {0:?}: expected a positive number of days or 'auto'")]
    InvalidWindow(String),

    #[error("no contact table found: the database has no *_friend_log_current table")]
    NoContactTable,

    #[error("multiple datasets found, pass an explicit prefix; detected: {0}")]
    AmbiguousPrefix(String),

    #[error("unsafe table name: {0:?}")]
    UnsafeTableName(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
