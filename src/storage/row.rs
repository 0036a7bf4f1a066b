//! Row and Value types for flintdb
//!
//! This module defines how data values are represented in memory.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A typed value in the database.
///
/// Equality is typed: an Integer never equals a Text, even when their
/// printed forms coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// UTF-8 text
    Text(String),
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Text(_) => "string",
        }
    }

    /// Try to read this value as an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(_) => None,
        }
    }

    /// Try to read this value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A row: primary key plus a column-name to value mapping.
///
/// The `deleted` flag is only meaningful immediately after decoding a record
/// from storage; a tombstoned row is never handed to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Primary key
    pub id: i64,
    /// Column values, in schema order, including `id`
    values: IndexMap<String, Value>,
    /// Tombstone flag as read from storage
    pub deleted: bool,
}

impl Row {
    /// Create a new live row with the given primary key
    pub fn new(id: i64) -> Self {
        let mut values = IndexMap::new();
        values.insert("id".to_string(), Value::Integer(id));
        Self {
            id,
            values,
            deleted: false,
        }
    }

    /// Set a column value
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Get a column value
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// All column values in insertion (schema) order
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Consume the row, returning its column map
    pub fn into_values(self) -> IndexMap<String, Value> {
        self.values
    }
}

// Rows render as a plain column->value object; the tombstone flag is
// transient state and never serialized.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
