//! Built-in defaults written to the local cache the first time a seeded
//! table is read and no cached copy exists yet.

use crate::record::{NamingConvention, SyncRecord};
use crate::table::Table;
use serde_json::{json, Value};

/// Returns the built-in records for `table`, or `None` if the table has no
/// defaults. Records are in the local (`camelCase`) convention.
pub fn defaults(table: Table) -> Option<Vec<SyncRecord>> {
    let rows = match table {
        Table::VisualCategories => visual_categories(),
        Table::Visuals => visuals(),
        Table::SiteSettings => site_settings(),
        _ => return None,
    };
    Some(
        rows.into_iter()
            .filter_map(|row| SyncRecord::from_value(row, NamingConvention::Camel).ok())
            .collect(),
    )
}

/// True if [`defaults`] has something for `table`.
pub fn is_seeded(table: Table) -> bool {
    matches!(
        table,
        Table::VisualCategories | Table::Visuals | Table::SiteSettings
    )
}

fn visual_categories() -> Vec<Value> {
    vec![
        json!({ "id": 1, "name": "Animaux", "slug": "animaux", "sortOrder": 1 }),
        json!({ "id": 2, "name": "Sport", "slug": "sport", "sortOrder": 2 }),
        json!({ "id": 3, "name": "Humour", "slug": "humour", "sortOrder": 3 }),
        json!({ "id": 4, "name": "Nature", "slug": "nature", "sortOrder": 4 }),
    ]
}

fn visuals() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Lion royal",
            "imageUrl": "/visuals/lion-royal.png",
            "visualCategoryId": 1,
            "tags": ["animal", "lion"],
            "isActive": true,
        }),
        json!({
            "id": 2,
            "name": "Loup hurlant",
            "imageUrl": "/visuals/loup-hurlant.png",
            "visualCategoryId": 1,
            "tags": ["animal", "loup"],
            "isActive": true,
        }),
        json!({
            "id": 3,
            "name": "Ballon de foot",
            "imageUrl": "/visuals/ballon-foot.png",
            "visualCategoryId": 2,
            "tags": ["sport", "football"],
            "isActive": true,
        }),
        json!({
            "id": 4,
            "name": "Montagne au lever du soleil",
            "imageUrl": "/visuals/montagne.png",
            "visualCategoryId": 4,
            "tags": ["nature", "montagne"],
            "isActive": true,
        }),
    ]
}

fn site_settings() -> Vec<Value> {
    vec![
        json!({ "id": 1, "key": "shopName", "value": "WinShirt" }),
        json!({ "id": 2, "key": "currency", "value": "EUR" }),
        json!({ "id": 3, "key": "maintenanceMode", "value": false }),
    ]
}
