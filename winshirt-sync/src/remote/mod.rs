//! Remote store adapter.
//!
//! [`RemoteStore`] is the seam between the sync engine and the hosted
//! relational backend. Rows crossing it are JSON objects in the remote
//! (`underscore_case`) convention. Expected failures come back as
//! [`RemoteError`] values; implementations never retry on their own.

mod memory;
mod postgrest;

pub use memory::MemoryRemote;
pub use postgrest::PostgrestClient;

use crate::error::RemoteResult;
use async_trait::async_trait;
use serde_json::Value;
use winshirt_model::{RecordId, Table};

/// Column equality predicate, e.g. `id = 7`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Remote (`underscore_case`) column name.
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn id(id: &RecordId) -> Self {
        Self::eq("id", id.to_json())
    }

    /// The value as PostgREST expects it after `eq.`.
    pub(crate) fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn matches(&self, row: &Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// CRUD access to the registered remote tables.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every row of a table.
    async fn select_all(&self, table: Table) -> RemoteResult<Vec<Value>>;

    /// Inserts or updates rows, matching on `conflict_key`. Returns the number
    /// of rows written. All rows of one call succeed or fail together.
    async fn upsert_batch(&self, table: Table, rows: &[Value], conflict_key: &str) -> RemoteResult<usize>;

    async fn delete_where(&self, table: Table, filter: &Filter) -> RemoteResult<()>;

    async fn count(&self, table: Table) -> RemoteResult<u64>;

    /// Cheapest possible read, used to check a table exists.
    async fn probe_table(&self, table: Table) -> RemoteResult<()>;

    /// Calls a named server-side function with a JSON payload.
    async fn rpc(&self, function: &str, payload: &Value) -> RemoteResult<Value>;
}
