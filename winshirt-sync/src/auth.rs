//! Session types and session persistence.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use winshirt_storage::{LocalCache, StorageResult, SESSION_KEY};

/// An authenticated session with the hosted backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds; `None` when the server did not say.
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| chrono::Utc::now().timestamp() >= at)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Auth state changes, in the order they happen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// Keeps the current session in the local cache so it survives restarts.
#[derive(Clone)]
pub struct SessionStore {
    cache: LocalCache,
}

impl SessionStore {
    pub fn new(cache: LocalCache) -> Self {
        Self { cache }
    }

    pub fn load(&self) -> Option<Session> {
        self.cache.read_value(SESSION_KEY)
    }

    pub fn save(&self, session: &Session) -> StorageResult<()> {
        self.cache.write_value(SESSION_KEY, session)
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.cache.remove_value(SESSION_KEY)
    }

    /// Applies one auth event to the persisted session.
    pub fn apply(&self, event: &AuthEvent) -> StorageResult<()> {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => self.save(session),
            AuthEvent::SignedOut => self.clear(),
        }
    }

    /// Persists every auth event until the sender side goes away.
    pub async fn follow(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = self.apply(&event) {
                        warn!("failed to persist auth session: {e}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("session store lagged by {skipped} auth events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
