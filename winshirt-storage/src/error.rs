//! Local cache error types.

use thiserror::Error;

/// Errors that can occur in local cache operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("local storage quota exceeded writing `{key}`: needs {needed} bytes, quota is {quota}")]
    QuotaExceeded { key: String, needed: u64, quota: u64 },

    #[error("local cache lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
