//! Sync-layer model for WinShirt.
//!
//! Everything here is pure data and pure functions:
//! - [`case`]: key rewriting between `underscore_case` (remote schema) and
//!   `camelCase` (local cache and in-memory model)
//! - [`table`]: the static registry of synchronized tables
//! - [`record`]: the [`SyncRecord`] envelope and its boundary validation
//! - [`seed`]: built-in defaults served on first run

pub mod case;
mod error;
pub mod record;
pub mod seed;
pub mod table;

pub use error::{ModelError, ModelResult};
pub use record::{NamingConvention, RecordId, SyncRecord};
pub use table::{FieldKind, Table, TableDescriptor, UpsertMode};
