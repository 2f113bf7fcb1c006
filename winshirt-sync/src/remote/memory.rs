//! In-process remote store.
//!
//! Behaves like the hosted backend as far as the sync layer can tell: rows
//! are keyed by `id`, upserts replace same-id rows, a rejected row fails its
//! whole call, and camelCase columns are refused as unknown columns. Failure
//! modes can be switched on to exercise the fallback paths.

use super::{Filter, RemoteStore};
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use winshirt_model::{RecordId, Table};

type RpcHandler = Box<dyn Fn(&Value) -> RemoteResult<Value> + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, BTreeMap<RecordId, Value>>,
    missing: HashSet<Table>,
    rejected: HashSet<(Table, RecordId)>,
    offline: bool,
    auth_failure: bool,
    upsert_calls: HashMap<Table, usize>,
    rpc: HashMap<String, RpcHandler>,
}

/// Remote store held in memory.
#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts rows directly, bypassing failure injection.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut state = self.lock();
        let stored = state.tables.entry(table).or_default();
        for row in rows {
            if let Some(id) = row_id(&row) {
                stored.insert(id, row);
            }
        }
    }

    /// Rows of a table, ordered by id.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock()
            .tables
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call fails as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every call fails as an auth rejection.
    pub fn set_auth_failure(&self, failing: bool) {
        self.lock().auth_failure = failing;
    }

    /// Makes a table behave as if it was never provisioned.
    pub fn drop_table(&self, table: Table) {
        let mut state = self.lock();
        state.missing.insert(table);
        state.tables.remove(&table);
    }

    /// Any upsert containing this record fails as a constraint violation.
    pub fn reject_record(&self, table: Table, id: impl Into<RecordId>) {
        self.lock().rejected.insert((table, id.into()));
    }

    pub fn register_rpc<F>(&self, name: &str, handler: F)
    where
        F: Fn(&Value) -> RemoteResult<Value> + Send + Sync + 'static,
    {
        self.lock().rpc.insert(name.to_string(), Box::new(handler));
    }

    /// Number of upsert calls received for a table.
    pub fn upsert_calls(&self, table: Table) -> usize {
        self.lock().upsert_calls.get(&table).copied().unwrap_or(0)
    }

    fn gate(state: &MemoryState, table: Option<Table>) -> RemoteResult<()> {
        if state.offline {
            return Err(RemoteError::Connectivity("connection refused".to_string()));
        }
        if state.auth_failure {
            return Err(RemoteError::Auth("JWT expired".to_string()));
        }
        if let Some(table) = table {
            if state.missing.contains(&table) {
                return Err(RemoteError::Schema(format!(
                    "relation \"public.{table}\" does not exist"
                )));
            }
        }
        Ok(())
    }
}

fn row_id(row: &Value) -> Option<RecordId> {
    match row.get("id")? {
        Value::Number(n) => n.as_i64().map(RecordId::Int),
        Value::String(s) => Some(RecordId::Text(s.clone())),
        _ => None,
    }
}

fn camel_column(row: &Value) -> Option<&str> {
    row.as_object()?
        .keys()
        .find(|k| k.chars().any(|c| c.is_ascii_uppercase()))
        .map(String::as_str)
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn select_all(&self, table: Table) -> RemoteResult<Vec<Value>> {
        let state = self.lock();
        Self::gate(&state, Some(table))?;
        Ok(state
            .tables
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_batch(&self, table: Table, rows: &[Value], conflict_key: &str) -> RemoteResult<usize> {
        let mut state = self.lock();
        Self::gate(&state, Some(table))?;
        *state.upsert_calls.entry(table).or_default() += 1;

        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(column) = camel_column(row) {
                return Err(RemoteError::Schema(format!(
                    "Could not find the '{column}' column of '{table}' in the schema cache"
                )));
            }
            let id = row
                .get(conflict_key)
                .and_then(|_| row_id(row))
                .ok_or_else(|| {
                    RemoteError::Rejected(format!(
                        "null value in column \"{conflict_key}\" of relation \"{table}\" violates not-null constraint"
                    ))
                })?;
            if state.rejected.contains(&(table, id.clone())) {
                return Err(RemoteError::Rejected(format!(
                    "new row for relation \"{table}\" violates check constraint (id {id})"
                )));
            }
            keyed.push((id, row.clone()));
        }

        let stored = state.tables.entry(table).or_default();
        for (id, row) in keyed {
            stored.insert(id, row);
        }
        Ok(rows.len())
    }

    async fn delete_where(&self, table: Table, filter: &Filter) -> RemoteResult<()> {
        let mut state = self.lock();
        Self::gate(&state, Some(table))?;
        if let Some(rows) = state.tables.get_mut(&table) {
            rows.retain(|_, row| !filter.matches(row));
        }
        Ok(())
    }

    async fn count(&self, table: Table) -> RemoteResult<u64> {
        let state = self.lock();
        Self::gate(&state, Some(table))?;
        Ok(state.tables.get(&table).map_or(0, |rows| rows.len() as u64))
    }

    async fn probe_table(&self, table: Table) -> RemoteResult<()> {
        let state = self.lock();
        Self::gate(&state, Some(table))
    }

    async fn rpc(&self, function: &str, payload: &Value) -> RemoteResult<Value> {
        let state = self.lock();
        Self::gate(&state, None)?;
        match state.rpc.get(function) {
            Some(handler) => handler(payload),
            None => Err(RemoteError::Schema(format!(
                "Could not find the function public.{function} in the schema cache"
            ))),
        }
    }
}
