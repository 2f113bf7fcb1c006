//! JSON export and import of cached tables.
//!
//! Exports are pretty-printed arrays of camelCase records. Imports accept
//! either convention and merge into the cache by id.

use crate::error::{SyncError, SyncResult};
use crate::types::ImportSummary;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};
use winshirt_model::{case, NamingConvention, RecordId, SyncRecord, Table};
use winshirt_storage::LocalCache;

/// Serializes a cached table as a JSON array indented with two spaces.
pub fn export_table(cache: &LocalCache, table: Table) -> SyncResult<String> {
    let rows: Vec<Value> = cache.read(table).iter().map(SyncRecord::to_value).collect();
    let json = serde_json::to_string_pretty(&rows)?;
    info!("exported {} {table} records", rows.len());
    Ok(json)
}

/// Merges a JSON array of records into a cached table.
///
/// Records that fail validation are reported in
/// [`ImportSummary::rejected`] and left out; the rest replace any cached
/// record with the same id.
pub fn import_table(cache: &LocalCache, table: Table, json: &str) -> SyncResult<ImportSummary> {
    let parsed: Value = serde_json::from_str(json)?;
    let Value::Array(items) = parsed else {
        return Err(SyncError::Import(format!(
            "expected a JSON array of {table} records"
        )));
    };

    let descriptor = table.descriptor();
    let mut summary = ImportSummary::default();
    let mut incoming: BTreeMap<RecordId, SyncRecord> = BTreeMap::new();

    for (index, item) in items.iter().enumerate() {
        let record = match SyncRecord::from_value(case::to_camel(item), NamingConvention::Camel) {
            Ok(record) => record,
            Err(e) => {
                summary.rejected.push(format!("entry {index}: {e}"));
                continue;
            }
        };
        if let Err(e) = record.validate(descriptor) {
            summary.rejected.push(e.to_string());
            continue;
        }
        incoming.insert(record.id.clone(), record);
    }

    if !summary.rejected.is_empty() {
        warn!("{} {table} entries rejected on import", summary.rejected.len());
    }
    if incoming.is_empty() {
        return Ok(summary);
    }

    let mut replaced = 0;
    cache.update(table, |existing| {
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        for record in existing {
            match incoming.remove(&record.id) {
                Some(newer) => {
                    replaced += 1;
                    merged.push(newer);
                }
                None => merged.push(record),
            }
        }
        summary.imported = replaced + incoming.len();
        merged.extend(incoming.into_values());
        merged
    })?;
    summary.replaced = replaced;

    info!(
        "imported {} {table} records ({} replaced)",
        summary.imported, summary.replaced
    );
    Ok(summary)
}

pub fn export_visuals(cache: &LocalCache) -> SyncResult<String> {
    export_table(cache, Table::Visuals)
}

pub fn import_visuals(cache: &LocalCache, json: &str) -> SyncResult<ImportSummary> {
    import_table(cache, Table::Visuals, json)
}
