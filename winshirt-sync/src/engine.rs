//! Sync engine: push (local → remote) and pull (remote → local) per table.
//!
//! Every crossing goes through the case converter: records leave the local
//! cache in camelCase and reach the remote store in underscore_case, and the
//! other way round on pull. Runs are strictly sequential: batches within a
//! table, then tables in registry order.

use crate::config::SyncConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::notice::Notifier;
use crate::remote::RemoteStore;
use crate::types::{SkipReason, SyncOutcome, SyncReport};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use winshirt_model::{NamingConvention, RecordId, SyncRecord, Table, UpsertMode};
use winshirt_storage::LocalCache;

/// Cooperative cancellation, checked between batches and between tables.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Orchestrates push and pull between the local cache and a remote store.
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    notifier: Notifier,
    batch_size: usize,
    request_timeout: Duration,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache, notifier: Notifier, config: &SyncConfig) -> Self {
        Self {
            remote,
            cache,
            notifier,
            batch_size: config.batch_size.max(1),
            request_timeout: config.request_timeout(),
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Bounds one remote call by the configured timeout.
    async fn call<T>(&self, fut: impl Future<Output = RemoteResult<T>>) -> RemoteResult<T> {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.request_timeout)),
        }
    }

    // ── Push ──

    /// Pushes one table's cached records to the remote store.
    pub async fn push(&self, table: Table) -> SyncOutcome {
        self.push_with(table, &CancelFlag::new()).await
    }

    pub async fn push_with(&self, table: Table, cancel: &CancelFlag) -> SyncOutcome {
        let records = self.cache.read(table);
        if records.is_empty() {
            info!("nothing to push for {table}");
            return SyncOutcome::skipped(table, SkipReason::NothingToSync, None);
        }

        let descriptor = table.descriptor();
        let mut failed_ids: Vec<RecordId> = Vec::new();
        let mut ready: Vec<SyncRecord> = Vec::with_capacity(records.len());
        let mut first_invalid: Option<String> = None;

        for record in records {
            match record.validate(descriptor) {
                Ok(()) => ready.push(record.into_remote()),
                Err(e) => {
                    warn!("excluding record from {table} push: {e}");
                    first_invalid.get_or_insert_with(|| e.to_string());
                    failed_ids.push(record.id);
                }
            }
        }
        if let Some(reason) = &first_invalid {
            self.notifier.error(
                format!("Sync {table}"),
                format!("{} record(s) failed validation: {reason}", failed_ids.len()),
            );
        }

        let chunk = match descriptor.upsert_mode {
            UpsertMode::Batched => self.batch_size,
            UpsertMode::PerRecord => 1,
        };
        let batches: Vec<&[SyncRecord]> = ready.chunks(chunk).collect();
        let total = batches.len();

        let mut pushed = 0;
        let mut last_error = first_invalid;
        let mut record_failures = 0;
        let mut interrupted: Option<SkipReason> = None;

        for (index, batch) in batches.iter().enumerate() {
            if interrupted.is_some() || cancel.is_cancelled() {
                interrupted.get_or_insert(SkipReason::Cancelled);
                failed_ids.extend(batch.iter().map(|r| r.id.clone()));
                continue;
            }

            let rows: Vec<Value> = batch.iter().map(SyncRecord::to_value).collect();
            match self
                .call(self.remote.upsert_batch(table, &rows, descriptor.conflict_key))
                .await
            {
                Ok(_) => {
                    pushed += batch.len();
                    debug!("{table}: batch {}/{total} pushed ({} records)", index + 1, batch.len());
                }
                Err(e) => {
                    failed_ids.extend(batch.iter().map(|r| r.id.clone()));
                    match descriptor.upsert_mode {
                        UpsertMode::Batched => self.notifier.error(
                            format!("Sync {table}"),
                            format!("batch {}/{total} failed: {e}", index + 1),
                        ),
                        UpsertMode::PerRecord => {
                            warn!("{table}: record {} failed: {e}", batch[0].id);
                            record_failures += 1;
                        }
                    }
                    if descriptor.upsert_mode == UpsertMode::Batched {
                        interrupted = self.confirm_outage(table, &e).await;
                    }
                    last_error = Some(e.to_string());
                }
            }
        }

        if record_failures > 0 {
            self.notifier.error(
                format!("Sync {table}"),
                format!(
                    "{record_failures} record(s) failed: {}",
                    last_error.as_deref().unwrap_or("unknown error")
                ),
            );
        }

        let outcome = SyncOutcome::pushed(table, pushed, failed_ids, last_error);
        info!(
            "push {table}: {} pushed, {} failed",
            outcome.pushed,
            outcome.failed_ids.len()
        );
        match interrupted {
            Some(reason) => outcome.with_skip(reason),
            None => outcome,
        }
    }

    /// Decides whether a failed batch means the rest of the table cannot go
    /// through. A systemic-looking error may still be row-specific (a
    /// row-level security denial, one slow request), so the table is probed
    /// and only a failing probe stops the push.
    async fn confirm_outage(&self, table: Table, err: &RemoteError) -> Option<SkipReason> {
        if !err.is_systemic() {
            return None;
        }
        match self.call(self.remote.probe_table(table)).await {
            Ok(()) => {
                debug!("{table}: probe ok after `{err}`, continuing with next batch");
                None
            }
            Err(probe) if probe.is_systemic() => {
                warn!("{table}: remote unusable ({probe}), stopping push");
                Some(SkipReason::from_remote(&probe))
            }
            Err(_) => None,
        }
    }

    // ── Pull ──

    /// Replaces one table's cached records with the remote rows.
    ///
    /// The cache is left untouched when the remote call fails, when it
    /// returns no rows at all, or when none of its rows can be read. Rows
    /// that cannot be read are left out and fail the outcome.
    pub async fn pull(&self, table: Table) -> SyncOutcome {
        let rows = match self.call(self.remote.select_all(table)).await {
            Ok(rows) => rows,
            Err(e) => {
                self.notifier
                    .error(format!("Pull {table}"), format!("keeping local data: {e}"));
                return SyncOutcome::skipped(table, SkipReason::from_remote(&e), Some(e.to_string()));
            }
        };

        // An empty result may be a fresh table or a wiped one; the local
        // copy wins either way.
        if rows.is_empty() {
            info!("remote {table} returned no rows, keeping local cache");
            return SyncOutcome::skipped(table, SkipReason::RemoteEmpty, None);
        }

        let received = rows.len();
        let mut records: Vec<SyncRecord> = Vec::with_capacity(received);
        let mut first_malformed: Option<String> = None;
        for row in rows {
            match SyncRecord::from_value(row, NamingConvention::Underscore) {
                Ok(rec) => records.push(rec.into_local()),
                Err(e) => {
                    warn!("skipping remote row from {table}: {e}");
                    first_malformed.get_or_insert_with(|| e.to_string());
                }
            }
        }
        let dropped = received - records.len();

        if records.is_empty() {
            let reason = first_malformed.unwrap_or_default();
            self.notifier.error(
                format!("Pull {table}"),
                format!("no readable rows in {received}, keeping local data: {reason}"),
            );
            return SyncOutcome::skipped(
                table,
                SkipReason::Malformed,
                Some(format!("{received} malformed remote row(s): {reason}")),
            );
        }

        if let Err(e) = self.cache.write(table, &records) {
            self.notifier
                .error(format!("Pull {table}"), format!("could not save locally: {e}"));
            return SyncOutcome::skipped(table, SkipReason::Storage, Some(e.to_string()));
        }
        info!("pulled {} records into {table}", records.len());

        let outcome = SyncOutcome::pulled(table, records.len());
        match first_malformed {
            Some(reason) => {
                let message = format!("{dropped} malformed remote row(s) skipped: {reason}");
                self.notifier.error(format!("Pull {table}"), message.clone());
                outcome.with_error(message)
            }
            None => outcome,
        }
    }

    // ── Whole set ──

    /// Pushes every registered table in registry order.
    pub async fn sync_all(&self) -> SyncReport {
        self.sync_all_with(&CancelFlag::new()).await
    }

    pub async fn sync_all_with(&self, cancel: &CancelFlag) -> SyncReport {
        let run_id = uuid::Uuid::now_v7();
        let report = async {
            let mut outcomes = Vec::with_capacity(Table::ALL.len());
            for table in Table::ALL {
                if cancel.is_cancelled() {
                    outcomes.push(SyncOutcome::skipped(table, SkipReason::Cancelled, None));
                    continue;
                }
                outcomes.push(self.push_with(table, cancel).await);
            }
            SyncReport::new(run_id, outcomes)
        }
        .instrument(info_span!("sync_all", %run_id))
        .await;

        self.announce(&report, "Synchronisation");
        report
    }

    /// Pulls every registered table in registry order.
    pub async fn pull_all(&self) -> SyncReport {
        let run_id = uuid::Uuid::now_v7();
        let report = async {
            let mut outcomes = Vec::with_capacity(Table::ALL.len());
            for table in Table::ALL {
                outcomes.push(self.pull(table).await);
            }
            SyncReport::new(run_id, outcomes)
        }
        .instrument(info_span!("pull_all", %run_id))
        .await;

        self.announce(&report, "Refresh");
        report
    }

    fn announce(&self, report: &SyncReport, title: &str) {
        if report.succeeded {
            self.notifier
                .success(title, format!("{} tables synchronized", report.outcomes.len()));
        } else {
            let failed: Vec<&str> = report.failed_tables().iter().map(|t| t.name()).collect();
            self.notifier.warning(
                title,
                format!("{} table(s) failed: {}", failed.len(), failed.join(", ")),
            );
        }
    }
}
