//! Local/remote sync for WinShirt.
//!
//! Keeps a local cache of the shop's tables in step with the hosted
//! relational backend:
//! - Push and pull per table, with camelCase ↔ underscore_case conversion
//! - Batched upserts with per-batch failure isolation
//! - Connectivity and schema checks that pick online or offline mode
//! - Local vs remote count reporting
//! - First-run seeding and JSON export/import of visuals

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod loader;
pub mod notice;
pub mod remote;
pub mod reporter;
pub mod transfer;
pub mod types;

pub use auth::{AuthEvent, Session, SessionStore, SessionUser};
pub use config::SyncConfig;
pub use engine::{CancelFlag, SyncEngine};
pub use error::{RemoteError, RemoteErrorKind, RemoteResult, SyncError, SyncResult};
pub use guard::ConnectivityGuard;
pub use loader::DataLoader;
pub use notice::{Notice, NoticeLevel, Notifier};
pub use remote::{Filter, MemoryRemote, PostgrestClient, RemoteStore};
pub use reporter::Reporter;
pub use types::*;
