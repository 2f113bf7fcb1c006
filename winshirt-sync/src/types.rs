//! Shared types for sync runs, connectivity and reporting.

use crate::error::{RemoteError, RemoteErrorKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use winshirt_model::{RecordId, Table, TableDescriptor};

/// Why a table's run ended without the normal push/pull path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Push found no local records. Benign.
    NothingToSync,
    /// Pull got zero rows; the local cache was kept as is.
    RemoteEmpty,
    Connectivity,
    Auth,
    Schema,
    /// Remote failure of another kind.
    Remote,
    /// The local cache refused the write (quota or I/O).
    Storage,
    /// Pull got rows but none could be read; the local cache was kept.
    Malformed,
    Cancelled,
}

impl SkipReason {
    pub fn from_remote(err: &RemoteError) -> Self {
        match err.kind() {
            RemoteErrorKind::Connectivity => SkipReason::Connectivity,
            RemoteErrorKind::Auth => SkipReason::Auth,
            RemoteErrorKind::Schema => SkipReason::Schema,
            RemoteErrorKind::Validation | RemoteErrorKind::Other => SkipReason::Remote,
        }
    }
}

/// Result of one push or pull of one table.
///
/// `succeeded` is never true while `failed_ids` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub table: Table,
    pub pushed: usize,
    pub pulled: usize,
    pub failed_ids: Vec<RecordId>,
    pub succeeded: bool,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
}

impl SyncOutcome {
    /// A push that reached the remote store. Succeeds iff nothing failed.
    pub fn pushed(table: Table, pushed: usize, failed_ids: Vec<RecordId>, error: Option<String>) -> Self {
        Self {
            table,
            pushed,
            pulled: 0,
            succeeded: failed_ids.is_empty(),
            failed_ids,
            skipped: None,
            error,
        }
    }

    /// A pull that replaced the local copy.
    pub fn pulled(table: Table, pulled: usize) -> Self {
        Self {
            table,
            pushed: 0,
            pulled,
            failed_ids: Vec::new(),
            succeeded: true,
            skipped: None,
            error: None,
        }
    }

    /// A run that stopped early. Only [`SkipReason::RemoteEmpty`] counts as
    /// success: the pull worked, there was just nothing to take.
    pub fn skipped(table: Table, reason: SkipReason, error: Option<String>) -> Self {
        Self {
            table,
            pushed: 0,
            pulled: 0,
            failed_ids: Vec::new(),
            succeeded: reason == SkipReason::RemoteEmpty,
            skipped: Some(reason),
            error,
        }
    }

    /// Fails an otherwise completed run, keeping its counts.
    pub(crate) fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self.succeeded = false;
        self
    }

    /// Marks a push interrupted part-way.
    pub(crate) fn with_skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self.succeeded = false;
        self
    }

    pub fn descriptor(&self) -> &'static TableDescriptor {
        self.table.descriptor()
    }

    /// True for real failures; "nothing to sync" is not one.
    pub fn is_failure(&self) -> bool {
        !self.succeeded && self.skipped != Some(SkipReason::NothingToSync)
    }
}

/// Outcomes of a whole-set run, in registry order.
///
/// `succeeded` is true when no outcome [is a failure](SyncOutcome::is_failure).
/// A push of an empty table ([`SkipReason::NothingToSync`]) has
/// `succeeded == false` on its own outcome but does not fail the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub run_id: uuid::Uuid,
    pub outcomes: Vec<SyncOutcome>,
    pub succeeded: bool,
}

impl SyncReport {
    pub fn new(run_id: uuid::Uuid, outcomes: Vec<SyncOutcome>) -> Self {
        let succeeded = outcomes.iter().all(|o| !o.is_failure());
        Self {
            run_id,
            outcomes,
            succeeded,
        }
    }

    pub fn failed_tables(&self) -> Vec<Table> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(|o| o.table)
            .collect()
    }

    pub fn outcome(&self, table: Table) -> Option<&SyncOutcome> {
        self.outcomes.iter().find(|o| o.table == table)
    }
}

/// Last known reachability of the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityStatus {
    pub connected: bool,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ConnectivityStatus {
    pub fn connected() -> Self {
        Self {
            connected: true,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }
}

/// Where reads and writes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Online,
    /// Local cache and seeded defaults only.
    Offline,
}

/// Local and remote record counts of one table.
///
/// `remote` is 0 when the remote count failed; check `remote_known` before
/// reading it as "confirmed empty".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCounts {
    pub local: u64,
    pub remote: u64,
    pub remote_known: bool,
}

impl DataCounts {
    /// Local minus remote.
    pub fn divergence(&self) -> i64 {
        self.local as i64 - self.remote as i64
    }

    /// True when both sides are known and differ.
    pub fn needs_sync(&self) -> bool {
        self.remote_known && self.local != self.remote
    }
}

/// Result of importing records from an exported file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub replaced: usize,
    pub rejected: Vec<String>,
}
