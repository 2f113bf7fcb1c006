//! Sync error types.
//!
//! Remote failures are classified into a small taxonomy ([`RemoteErrorKind`])
//! that the sync engine and the connectivity guard branch on.

use std::time::Duration;
use thiserror::Error;
use winshirt_model::ModelError;
use winshirt_storage::StorageError;

/// Result type for remote store calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Coarse classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Unreachable, timed out or temporarily unavailable. Fall back to the
    /// local cache.
    Connectivity,
    /// Credential or session rejected.
    Auth,
    /// Table or column missing.
    Schema,
    /// Data rejected by a constraint or type check.
    Validation,
    Other,
}

/// Errors returned by a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store unreachable: {0}")]
    Connectivity(String),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("data rejected: {0}")]
    Rejected(String),

    #[error("remote request failed ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteError::Connectivity(_) | RemoteError::Timeout(_) => RemoteErrorKind::Connectivity,
            RemoteError::Auth(_) => RemoteErrorKind::Auth,
            RemoteError::Schema(_) => RemoteErrorKind::Schema,
            RemoteError::Rejected(_) => RemoteErrorKind::Validation,
            RemoteError::Api { .. } | RemoteError::Serialization(_) => RemoteErrorKind::Other,
        }
    }

    /// True for failures that may hit every further call to the same store.
    /// Some are row-specific in practice (a row-level security denial), so
    /// callers confirm with a probe before giving up on a table.
    pub fn is_systemic(&self) -> bool {
        matches!(
            self.kind(),
            RemoteErrorKind::Connectivity | RemoteErrorKind::Auth | RemoteErrorKind::Schema
        )
    }

    /// Classifies an HTTP error response from a PostgREST-style backend.
    ///
    /// `body` is the raw response body, usually
    /// `{"code": "...", "message": "...", "details": ..., "hint": ...}`.
    /// HEAD requests get no body, so a bare 404 is read as a missing table.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let code = field("code").or_else(|| field("error_code"));
        let message = field("message")
            .or_else(|| field("msg"))
            .or_else(|| field("error_description"))
            .or_else(|| field("error"))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.to_string()
                }
            });

        let code_str = code.as_deref().unwrap_or("");
        let lower = message.to_lowercase();

        if status == 401
            || status == 403
            || code_str.starts_with("PGRST30")
            || code_str == "42501"
            || lower.contains("jwt")
        {
            return RemoteError::Auth(message);
        }
        if matches!(code_str, "42P01" | "42703" | "42883" | "PGRST200" | "PGRST202" | "PGRST204" | "PGRST205")
            || (status == 404
                && (body.trim().is_empty() || lower.contains("does not exist") || lower.contains("could not find")))
        {
            return RemoteError::Schema(message);
        }
        if code_str.starts_with("23") || code_str.starts_with("22") || status == 409 || status == 422 {
            return RemoteError::Rejected(message);
        }
        if matches!(status, 408 | 502 | 503 | 504) {
            return RemoteError::Connectivity(message);
        }
        RemoteError::Api {
            status,
            code,
            message,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            RemoteError::Connectivity(e.to_string())
        } else {
            RemoteError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                code: None,
                message: e.to_string(),
            }
        }
    }
}

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("local cache error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid record: {0}")]
    Model(#[from] ModelError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("import failed: {0}")]
    Import(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
