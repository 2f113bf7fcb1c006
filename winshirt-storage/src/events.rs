//! Table-changed notifications.

use winshirt_model::Table;

/// What happened to a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    Written,
    Cleared,
}

/// Published after every successful write or clear, before the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: String,
    pub kind: CacheEventKind,
}

impl CacheEvent {
    /// The table behind the key, if the key is a table key.
    pub fn table(&self) -> Option<Table> {
        self.key.parse().ok()
    }
}
