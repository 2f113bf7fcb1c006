//! Local vs remote record counts, for reconciliation displays.

use crate::remote::RemoteStore;
use crate::types::DataCounts;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use winshirt_model::Table;
use winshirt_storage::LocalCache;

/// Read-only view over both sides; never mutates either.
pub struct Reporter {
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    timeout: Duration,
}

impl Reporter {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache, timeout: Duration) -> Self {
        Self {
            remote,
            cache,
            timeout,
        }
    }

    pub async fn table_counts(&self, table: Table) -> DataCounts {
        let local = self.cache.len(table) as u64;
        let remote = match tokio::time::timeout(self.timeout, self.remote.count(table)).await {
            Ok(Ok(n)) => Some(n),
            Ok(Err(e)) => {
                warn!("remote count for {table} failed: {e}");
                None
            }
            Err(_) => {
                warn!("remote count for {table} timed out");
                None
            }
        };
        DataCounts {
            local,
            remote: remote.unwrap_or(0),
            remote_known: remote.is_some(),
        }
    }

    /// Counts for every registered table, keyed by table name.
    pub async fn get_data_counts(&self) -> BTreeMap<String, DataCounts> {
        let mut counts = BTreeMap::new();
        for table in Table::ALL {
            counts.insert(table.name().to_string(), self.table_counts(table).await);
        }
        counts
    }

    /// Tables whose local and remote counts are both known and differ.
    pub async fn tables_needing_sync(&self) -> Vec<Table> {
        let mut out = Vec::new();
        for table in Table::ALL {
            if self.table_counts(table).await.needs_sync() {
                out.push(table);
            }
        }
        out
    }
}
