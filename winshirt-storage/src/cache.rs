//! Local cache store: one JSON array per table, fully replaced on write.
//!
//! Reads never fail: a missing key, a corrupted value or a database error
//! all read as "no data" and are logged. Writes report errors (quota, I/O)
//! to the caller, who decides how loudly to surface them.

use crate::error::{StorageError, StorageResult};
use crate::events::{CacheEvent, CacheEventKind};
use duckdb::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use winshirt_model::{NamingConvention, SyncRecord, Table};

/// Non-table key holding the persisted auth session.
pub const SESSION_KEY: &str = "session";

/// Non-table key holding the developer-mode toggle.
pub const DEV_MODE_KEY: &str = "devMode";

const EVENT_CHANNEL_CAPACITY: usize = 256;

const CACHE_MEMORY_LIMIT: &str = "32MB";
const CACHE_THREADS: u32 = 1;

/// Keyed JSON cache backed by DuckDB.
#[derive(Clone)]
pub struct LocalCache {
    conn: Arc<Mutex<Connection>>,
    quota_bytes: Option<u64>,
    events: broadcast::Sender<CacheEvent>,
}

impl LocalCache {
    /// Opens or creates a cache at the given path.
    ///
    /// A crash can leave a write-ahead log that DuckDB refuses to replay. When
    /// the first open fails and such a log exists, it is discarded and the
    /// open is tried once more.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(first) => {
                let wal = wal_path(path);
                if !wal.exists() {
                    return Err(first.into());
                }
                warn!("cache at {} did not open ({first}), discarding {}", path.display(), wal.display());
                std::fs::remove_file(&wal).map_err(|_| first)?;
                Connection::open(path)?
            }
        };
        conn.execute_batch(&format!(
            "SET memory_limit='{CACHE_MEMORY_LIMIT}'; SET threads={CACHE_THREADS};"
        ))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory cache (for testing and ephemeral sessions).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        initialize_cache_schema(&conn)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            quota_bytes: None,
            events,
        })
    }

    /// Caps the total stored bytes across all keys.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Configured byte cap, if any.
    pub fn quota(&self) -> Option<u64> {
        self.quota_bytes
    }

    /// Subscribes to table-changed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    // ── Tables ──

    /// Reads every cached record of a table. Corrupted or missing data
    /// reads as an empty list.
    pub fn read(&self, table: Table) -> Vec<SyncRecord> {
        match self.try_read(table) {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read cached {table}, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    /// Like [`read`](Self::read), but tells "no key" (`None`) apart from an
    /// empty table and reports errors.
    pub fn try_read(&self, table: Table) -> StorageResult<Option<Vec<SyncRecord>>> {
        let raw = {
            let conn = self.lock()?;
            get_raw(&conn, table.name())?
        };
        let Some(raw) = raw else {
            return Ok(None);
        };
        let rows: Vec<Value> = serde_json::from_str(&raw)?;
        let records = rows
            .into_iter()
            .filter_map(|row| match SyncRecord::from_value(row, NamingConvention::Camel) {
                Ok(rec) => Some(rec),
                Err(e) => {
                    warn!("skipping malformed cached row in {table}: {e}");
                    None
                }
            })
            .collect();
        Ok(Some(records))
    }

    /// Replaces the cached content of a table and notifies subscribers.
    ///
    /// Records are stored in the local convention whatever their current one.
    pub fn write(&self, table: Table, records: &[SyncRecord]) -> StorageResult<()> {
        {
            let conn = self.lock()?;
            self.write_records(&conn, table, records)?;
        }
        self.notify(table.name(), CacheEventKind::Written);
        Ok(())
    }

    /// Read-modify-write on one table while holding the cache lock.
    pub fn update<F>(&self, table: Table, f: F) -> StorageResult<()>
    where
        F: FnOnce(Vec<SyncRecord>) -> Vec<SyncRecord>,
    {
        {
            let conn = self.lock()?;
            let current = match get_raw(&conn, table.name())? {
                Some(raw) => parse_records(table, &raw),
                None => Vec::new(),
            };
            let next = f(current);
            self.write_records(&conn, table, &next)?;
        }
        self.notify(table.name(), CacheEventKind::Written);
        Ok(())
    }

    /// Removes a table's key and notifies subscribers.
    pub fn clear(&self, table: Table) -> StorageResult<()> {
        {
            let conn = self.lock()?;
            delete_raw(&conn, table.name())?;
        }
        self.notify(table.name(), CacheEventKind::Cleared);
        Ok(())
    }

    /// Removes every table key. Non-table keys are left alone.
    pub fn clear_all(&self) -> StorageResult<()> {
        {
            let conn = self.lock()?;
            for table in Table::ALL {
                delete_raw(&conn, table.name())?;
            }
        }
        for table in Table::ALL {
            self.notify(table.name(), CacheEventKind::Cleared);
        }
        Ok(())
    }

    /// True if the table has ever been written (even as an empty list).
    pub fn has_table(&self, table: Table) -> bool {
        self.has_key(table.name())
    }

    /// True if any value, table or not, is stored under `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.lock()
            .and_then(|conn| get_raw(&conn, key))
            .map(|raw| raw.is_some())
            .unwrap_or(false)
    }

    /// Number of cached records of a table.
    pub fn len(&self, table: Table) -> usize {
        self.read(table).len()
    }

    // ── Non-table keys ──

    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.lock().and_then(|conn| get_raw(&conn, key));
        match raw {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("ignoring corrupted cache value `{key}`: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read cache value `{key}`: {e}");
                None
            }
        }
    }

    pub fn write_value<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        {
            let conn = self.lock()?;
            self.put_raw(&conn, key, &raw)?;
        }
        self.notify(key, CacheEventKind::Written);
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> StorageResult<()> {
        {
            let conn = self.lock()?;
            delete_raw(&conn, key)?;
        }
        self.notify(key, CacheEventKind::Cleared);
        Ok(())
    }

    /// Current value of the developer-mode toggle.
    pub fn dev_mode(&self) -> bool {
        self.read_value(DEV_MODE_KEY).unwrap_or(false)
    }

    pub fn set_dev_mode(&self, enabled: bool) -> StorageResult<()> {
        self.write_value(DEV_MODE_KEY, &enabled)
    }

    /// Total bytes currently stored across all keys.
    pub fn used_bytes(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let bytes: i64 = conn.query_row(
            "SELECT CAST(COALESCE(SUM(LENGTH(value)), 0) AS BIGINT) FROM cache_entries",
            [],
            |row| row.get(0),
        )?;
        Ok(bytes as u64)
    }

    // ── Internals ──

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn write_records(&self, conn: &Connection, table: Table, records: &[SyncRecord]) -> StorageResult<()> {
        let rows: Vec<Value> = records
            .iter()
            .map(|rec| rec.clone().into_local().to_value())
            .collect();
        let raw = serde_json::to_string(&rows)?;
        self.put_raw(conn, table.name(), &raw)?;
        debug!("cached {} records for {table}", rows.len());
        Ok(())
    }

    fn put_raw(&self, conn: &Connection, key: &str, raw: &str) -> StorageResult<()> {
        if let Some(quota) = self.quota_bytes {
            let others: i64 = conn.query_row(
                "SELECT CAST(COALESCE(SUM(LENGTH(value)), 0) AS BIGINT) FROM cache_entries WHERE key <> ?",
                params![key],
                |row| row.get(0),
            )?;
            let needed = others as u64 + raw.len() as u64;
            if needed > quota {
                warn!("local cache quota exceeded writing `{key}` ({needed} > {quota} bytes)");
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, raw, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn notify(&self, key: &str, kind: CacheEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(CacheEvent {
            key: key.to_string(),
            kind,
        });
    }
}

/// `shop.duckdb` → `shop.duckdb.wal`.
fn wal_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".wal");
    PathBuf::from(name)
}

fn parse_records(table: Table, raw: &str) -> Vec<SyncRecord> {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(rows) => rows
            .into_iter()
            .filter_map(|row| SyncRecord::from_value(row, NamingConvention::Camel).ok())
            .collect(),
        Err(e) => {
            warn!("cached {table} is corrupted, starting from empty: {e}");
            Vec::new()
        }
    }
}

fn get_raw(conn: &Connection, key: &str) -> StorageResult<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM cache_entries WHERE key = ?",
        params![key],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(raw) => Ok(Some(raw)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn delete_raw(conn: &Connection, key: &str) -> StorageResult<()> {
    conn.execute("DELETE FROM cache_entries WHERE key = ?", params![key])?;
    Ok(())
}

fn initialize_cache_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            key VARCHAR PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at BIGINT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
