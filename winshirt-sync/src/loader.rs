//! Table loading for the application: remote when online, cache otherwise,
//! built-in defaults on first run.

use crate::engine::SyncEngine;
use crate::guard::ConnectivityGuard;
use crate::types::SyncMode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use winshirt_model::{seed, SyncRecord, Table};

pub struct DataLoader {
    engine: Arc<SyncEngine>,
    guard: Arc<ConnectivityGuard>,
}

impl DataLoader {
    pub fn new(engine: Arc<SyncEngine>, guard: Arc<ConnectivityGuard>) -> Self {
        Self { engine, guard }
    }

    /// Records of one table. Never fails; the worst case is an empty list.
    pub async fn load(&self, table: Table) -> Vec<SyncRecord> {
        if self.guard.mode() == SyncMode::Online {
            let outcome = self.engine.pull(table).await;
            if outcome.is_failure() {
                debug!("pull of {table} failed, serving cached copy");
            }
        }
        self.local_or_seed(table)
    }

    /// Cached records, seeding the defaults when the table was never stored.
    pub fn local_or_seed(&self, table: Table) -> Vec<SyncRecord> {
        let cache = self.engine.cache();
        match cache.try_read(table) {
            Ok(Some(records)) => records,
            Ok(None) => match seed::defaults(table) {
                Some(defaults) => {
                    info!("seeding {table} with {} default records", defaults.len());
                    if let Err(e) = cache.write(table, &defaults) {
                        self.engine
                            .notifier()
                            .error(format!("Load {table}"), format!("could not save defaults locally: {e}"));
                    }
                    defaults
                }
                None => Vec::new(),
            },
            Err(e) => {
                warn!("cached {table} is unreadable: {e}");
                Vec::new()
            }
        }
    }

    pub async fn products(&self) -> Vec<SyncRecord> {
        self.load(Table::Products).await
    }

    pub async fn lotteries(&self) -> Vec<SyncRecord> {
        self.load(Table::Lotteries).await
    }

    pub async fn visuals(&self) -> Vec<SyncRecord> {
        self.load(Table::Visuals).await
    }

    pub async fn visual_categories(&self) -> Vec<SyncRecord> {
        self.load(Table::VisualCategories).await
    }

    pub async fn site_settings(&self) -> Vec<SyncRecord> {
        self.load(Table::SiteSettings).await
    }
}
