//! DuckDB-backed local cache for WinShirt.
//!
//! The cache is the offline fallback and read cache of the storefront. Each
//! synchronized table is kept under its own key as a JSON array of records in
//! the local (`camelCase`) convention, next to a few non-table keys (session,
//! feature toggles).
//!
//! # Architecture
//!
//! - One `cache_entries` key/value table, values are JSON text
//! - Writes replace the whole value for a key, never merge
//! - Every write or clear publishes a [`CacheEvent`] on one broadcast channel

mod cache;
mod error;
mod events;

pub use cache::{LocalCache, DEV_MODE_KEY, SESSION_KEY};
pub use error::{StorageError, StorageResult};
pub use events::{CacheEvent, CacheEventKind};
