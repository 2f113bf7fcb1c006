//! Connectivity and schema checks that decide between online and offline mode.

use crate::remote::RemoteStore;
use crate::types::{ConnectivityStatus, SyncMode};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{info, warn};
use winshirt_model::Table;

struct GuardState {
    status: Option<ConnectivityStatus>,
    missing: Vec<Table>,
    schema_ok: bool,
}

/// Tracks whether the remote store is reachable and fully provisioned.
///
/// Nothing here ever fails: every problem is folded into the stored status
/// and the resulting [`SyncMode`].
pub struct ConnectivityGuard {
    remote: Arc<dyn RemoteStore>,
    probe_table: Table,
    timeout: Duration,
    state: RwLock<GuardState>,
}

impl ConnectivityGuard {
    pub fn new(remote: Arc<dyn RemoteStore>, probe_table: Table, timeout: Duration) -> Self {
        Self {
            remote,
            probe_table,
            timeout,
            state: RwLock::new(GuardState {
                status: None,
                missing: Vec::new(),
                schema_ok: false,
            }),
        }
    }

    /// Counts rows of the probe table and records the result.
    pub async fn probe(&self) -> ConnectivityStatus {
        let result = tokio::time::timeout(self.timeout, self.remote.count(self.probe_table)).await;
        let status = match result {
            Ok(Ok(_)) => ConnectivityStatus::connected(),
            Ok(Err(e)) => {
                warn!("connectivity probe on {} failed: {e}", self.probe_table);
                ConnectivityStatus::disconnected(e.to_string())
            }
            Err(_) => {
                warn!("connectivity probe timed out after {:?}", self.timeout);
                ConnectivityStatus::disconnected(format!("timed out after {:?}", self.timeout))
            }
        };
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = Some(status.clone());
        status
    }

    /// Checks that every registered table answers a trivial select.
    ///
    /// Missing tables are logged and remembered; nothing is created.
    pub async fn ensure_schema(&self) -> bool {
        let mut missing = Vec::new();
        for table in Table::ALL {
            match tokio::time::timeout(self.timeout, self.remote.probe_table(table)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("table {table} is not available: {e}");
                    missing.push(table);
                }
                Err(_) => {
                    warn!("schema check on {table} timed out");
                    missing.push(table);
                }
            }
        }
        let ok = missing.is_empty();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.missing = missing;
        state.schema_ok = ok;
        ok
    }

    /// Probes, then checks the schema when reachable.
    pub async fn startup(&self) -> SyncMode {
        let status = self.probe().await;
        if status.connected {
            if !self.ensure_schema().await {
                warn!("remote schema incomplete: {:?}", self.missing_tables());
            }
        } else {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.schema_ok = false;
        }
        let mode = self.mode();
        info!("starting in {mode:?} mode");
        mode
    }

    /// Last probe result; `None` before the first probe.
    pub fn status(&self) -> Option<ConnectivityStatus> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone()
    }

    /// Online only when the last probe succeeded and the schema is complete.
    pub fn mode(&self) -> SyncMode {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let connected = state.status.as_ref().is_some_and(|s| s.connected);
        if connected && state.schema_ok {
            SyncMode::Online
        } else {
            SyncMode::Offline
        }
    }

    pub fn missing_tables(&self) -> Vec<Table> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .missing
            .clone()
    }
}
