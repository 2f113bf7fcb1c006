//! Shared helpers for the sync integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use winshirt_model::{NamingConvention, SyncRecord, Table};
use winshirt_storage::LocalCache;
use winshirt_sync::{
    ConnectivityGuard, DataLoader, MemoryRemote, Notice, Notifier, Reporter, SyncConfig, SyncEngine,
};

/// Routes `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> SyncConfig {
    SyncConfig {
        remote_url: "http://localhost:54321".into(),
        anon_key: "anon-key".into(),
        ..SyncConfig::default()
    }
}

/// An engine wired to an in-memory remote and an in-memory cache.
pub struct Harness {
    pub remote: Arc<MemoryRemote>,
    pub cache: LocalCache,
    pub notifier: Notifier,
    pub engine: Arc<SyncEngine>,
    pub guard: Arc<ConnectivityGuard>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&test_config())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        init_tracing();
        let remote = Arc::new(MemoryRemote::new());
        let cache = config.open_cache(None).unwrap();
        let notifier = Notifier::new();
        let engine = Arc::new(SyncEngine::new(
            remote.clone(),
            cache.clone(),
            notifier.clone(),
            config,
        ));
        let guard = Arc::new(ConnectivityGuard::new(
            remote.clone(),
            config.probe_table,
            config.request_timeout(),
        ));
        Self {
            remote,
            cache,
            notifier,
            engine,
            guard,
        }
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new(self.engine.clone(), self.guard.clone())
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::new(
            self.remote.clone(),
            self.cache.clone(),
            test_config().request_timeout(),
        )
    }
}

/// A camelCase record built from a JSON object literal.
pub fn record(id: i64, fields: Value) -> SyncRecord {
    let fields = fields.as_object().cloned().unwrap_or_default();
    SyncRecord::new(id, fields, NamingConvention::Camel)
}

pub fn product(id: i64) -> SyncRecord {
    record(
        id,
        json!({
            "name": format!("T-shirt {id}"),
            "price": 19.9,
            "visualCategoryId": 2,
            "printAreas": ["front", "back"],
        }),
    )
}

pub fn lottery(id: i64) -> SyncRecord {
    record(
        id,
        json!({ "title": format!("Lottery {id}"), "value": 50, "isActive": true }),
    )
}

pub fn visual(id: i64) -> SyncRecord {
    record(
        id,
        json!({
            "name": format!("Visual {id}"),
            "imageUrl": format!("https://cdn.example.com/v{id}.png"),
            "visualCategoryId": 1,
        }),
    )
}

pub fn write(cache: &LocalCache, table: Table, records: Vec<SyncRecord>) {
    cache.write(table, &records).unwrap();
}

/// Every notice received so far.
pub fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        out.push(notice);
    }
    out
}
