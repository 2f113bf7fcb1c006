//! Model error types.

use thiserror::Error;

/// Errors raised while interpreting records and table names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no usable id (expected integer or string)")]
    MissingId,

    #[error("record {id} in {table} is missing required field `{field}`")]
    MissingField {
        table: String,
        id: String,
        field: String,
    },

    #[error("record {id} in {table}: field `{field}` must be {expected}")]
    WrongType {
        table: String,
        id: String,
        field: String,
        expected: &'static str,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;
