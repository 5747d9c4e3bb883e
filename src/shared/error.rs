use thiserror::Error;

/// Unified error type for the mirror engine.
///
/// `Offline` and `Rejected` describe the remote backend and are recoverable:
/// an offline record stays pending for the next sweep, a rejected record is
/// quarantined until it is edited again. `Storage` is the only class a read
/// or write path is allowed to surface to callers unconditionally.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote unreachable: {0}")]
    Offline(String),

    #[error("Remote rejected the record: {0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // Transport-level failures are indistinguishable from being offline.
        AppError::Offline(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
