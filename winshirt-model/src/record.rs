//! The generic envelope a record travels in when it crosses a store boundary.

use crate::case;
use crate::error::{ModelError, ModelResult};
use crate::table::TableDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Record identifier, unique within a table.
///
/// Kept verbatim across both naming conventions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) if !s.is_empty() => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RecordId::Int(n) => Value::from(*n),
            RecordId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// Naming convention of a record's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    /// Remote schema (`visual_category_id`).
    Underscore,
    /// Local cache and in-memory model (`visualCategoryId`).
    Camel,
}

/// One entity of a table, in exactly one naming convention.
///
/// `fields` never contains `id`; it is held separately so that it can never
/// be renamed by a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord {
    pub id: RecordId,
    pub fields: Map<String, Value>,
    pub convention: NamingConvention,
}

impl SyncRecord {
    pub fn new(id: impl Into<RecordId>, mut fields: Map<String, Value>, convention: NamingConvention) -> Self {
        fields.remove("id");
        Self {
            id: id.into(),
            fields,
            convention,
        }
    }

    /// Builds a record from a JSON object whose keys follow `convention`.
    pub fn from_value(value: Value, convention: NamingConvention) -> ModelResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ModelError::NotAnObject);
        };
        let id = fields
            .remove("id")
            .as_ref()
            .and_then(RecordId::from_json)
            .ok_or(ModelError::MissingId)?;
        Ok(Self {
            id,
            fields,
            convention,
        })
    }

    /// Flattens the record back into a JSON object, `id` included.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert("id".to_string(), self.id.to_json());
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    /// Returns the record in the remote (`underscore_case`) convention.
    pub fn into_remote(self) -> Self {
        match self.convention {
            NamingConvention::Underscore => self,
            NamingConvention::Camel => Self {
                id: self.id,
                fields: case::map_to_underscore(&self.fields),
                convention: NamingConvention::Underscore,
            },
        }
    }

    /// Returns the record in the local (`camelCase`) convention.
    pub fn into_local(self) -> Self {
        match self.convention {
            NamingConvention::Camel => self,
            NamingConvention::Underscore => Self {
                id: self.id,
                fields: case::map_to_camel(&self.fields),
                convention: NamingConvention::Camel,
            },
        }
    }

    /// Looks up a field by its local (`camelCase`) name, whatever the
    /// record's current convention.
    pub fn get(&self, local_name: &str) -> Option<&Value> {
        match self.convention {
            NamingConvention::Camel => self.fields.get(local_name),
            NamingConvention::Underscore => self.fields.get(&case::camel_to_underscore(local_name)),
        }
    }

    /// Checks the record against the table's required fields.
    pub fn validate(&self, descriptor: &TableDescriptor) -> ModelResult<()> {
        for (field, kind) in descriptor.required_fields {
            match self.get(field) {
                None | Some(Value::Null) => {
                    return Err(ModelError::MissingField {
                        table: descriptor.name.to_string(),
                        id: self.id.to_string(),
                        field: (*field).to_string(),
                    });
                }
                Some(value) if !kind.accepts(value) => {
                    return Err(ModelError::WrongType {
                        table: descriptor.name.to_string(),
                        id: self.id.to_string(),
                        field: (*field).to_string(),
                        expected: kind.describe(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
