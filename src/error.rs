//! Error types for the sync engine

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync engine error type
///
/// Variants carry stringified sources so the error stays `Clone` — the
/// single-flight guard hands the same cycle result to every concurrent
/// caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Missing, expired or rejected credentials (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport failures, timeouts and non-auth HTTP errors
    #[error("Network error: {0}")]
    Network(String),

    /// The backend asked us to back off (HTTP 429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Remote backend provisioning/validation failed before any merge ran
    #[error("Backend setup failed: {0}")]
    Setup(String),

    /// Local data could not be serialized or deserialized
    #[error("Data error: {0}")]
    Data(String),

    /// Local key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SyncError {
    /// True for failures of remote provisioning, as opposed to a failed
    /// sync cycle proper. Callers surface these as "setup failed".
    pub fn is_setup(&self) -> bool {
        matches!(self, SyncError::Setup(_))
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Data(e.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Network(e.to_string())
    }
}
