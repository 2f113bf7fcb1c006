//! Static registry of the tables kept in sync between the local cache and
//! the remote store.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A registered table.
///
/// Declaration order is sync order: parents come before the rows that
/// reference them (orders reference clients, order items reference orders,
/// visuals reference visual categories).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Lotteries,
    Products,
    LotteryParticipants,
    LotteryWinners,
    Clients,
    Orders,
    OrderItems,
    VisualCategories,
    Visuals,
    SiteSettings,
    UserRoles,
}

/// How the sync engine sends a table's records to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertMode {
    /// Fixed-size batches; a failed batch fails all of its records.
    Batched,
    /// One record per call so a bad record never blocks another.
    PerRecord,
}

/// Expected JSON type of a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    /// Any non-null value.
    Any,
}

impl FieldKind {
    pub fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Any => !value.is_null(),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Number => "a number",
            FieldKind::Bool => "a boolean",
            FieldKind::Any => "non-null",
        }
    }
}

/// Identifies one logical dataset synchronized between local and remote.
#[derive(Debug)]
pub struct TableDescriptor {
    pub table: Table,
    pub name: &'static str,
    /// Required fields, named in the local (`camelCase`) convention.
    pub required_fields: &'static [(&'static str, FieldKind)],
    pub upsert_mode: UpsertMode,
    pub conflict_key: &'static str,
}

impl TableDescriptor {
    /// Names of the required fields as a set.
    pub fn required_field_names(&self) -> BTreeSet<&'static str> {
        self.required_fields.iter().map(|(name, _)| *name).collect()
    }
}

static REGISTRY: [TableDescriptor; 11] = [
    TableDescriptor {
        table: Table::Lotteries,
        name: "lotteries",
        required_fields: &[("title", FieldKind::Text), ("value", FieldKind::Number)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::Products,
        name: "products",
        required_fields: &[("name", FieldKind::Text), ("price", FieldKind::Number)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::LotteryParticipants,
        name: "lottery_participants",
        required_fields: &[("lotteryId", FieldKind::Any), ("email", FieldKind::Text)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::LotteryWinners,
        name: "lottery_winners",
        required_fields: &[("lotteryId", FieldKind::Any), ("name", FieldKind::Text)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::Clients,
        name: "clients",
        required_fields: &[("email", FieldKind::Text)],
        upsert_mode: UpsertMode::PerRecord,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::Orders,
        name: "orders",
        required_fields: &[("total", FieldKind::Number), ("status", FieldKind::Text)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::OrderItems,
        name: "order_items",
        required_fields: &[
            ("orderId", FieldKind::Any),
            ("productId", FieldKind::Any),
            ("quantity", FieldKind::Number),
        ],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::VisualCategories,
        name: "visual_categories",
        required_fields: &[("name", FieldKind::Text)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::Visuals,
        name: "visuals",
        required_fields: &[("name", FieldKind::Text), ("imageUrl", FieldKind::Text)],
        upsert_mode: UpsertMode::PerRecord,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::SiteSettings,
        name: "site_settings",
        required_fields: &[("key", FieldKind::Text)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
    TableDescriptor {
        table: Table::UserRoles,
        name: "user_roles",
        required_fields: &[("userId", FieldKind::Any), ("role", FieldKind::Text)],
        upsert_mode: UpsertMode::Batched,
        conflict_key: "id",
    },
];

impl Table {
    /// Every registered table, in sync order.
    pub const ALL: [Table; 11] = [
        Table::Lotteries,
        Table::Products,
        Table::LotteryParticipants,
        Table::LotteryWinners,
        Table::Clients,
        Table::Orders,
        Table::OrderItems,
        Table::VisualCategories,
        Table::Visuals,
        Table::SiteSettings,
        Table::UserRoles,
    ];

    pub fn descriptor(self) -> &'static TableDescriptor {
        // REGISTRY is declared in the same order as the enum variants.
        &REGISTRY[self as usize]
    }

    /// Remote table name, also used as the local cache key.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn upsert_mode(self) -> UpsertMode {
        self.descriptor().upsert_mode
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ModelError::UnknownTable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_matches_enum_order() {
        for table in Table::ALL {
            assert_eq!(table.descriptor().table, table);
        }
    }
}
