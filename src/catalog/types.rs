//! Data types for flintdb
//!
//! This module defines the two column types supported by the engine and the
//! rules for converting text literals into typed values.

use crate::error::{Error, Result};
use crate::storage::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer
    Integer,
    /// UTF-8 text
    Text,
}

impl DataType {
    /// Try to parse a type keyword from a CREATE TABLE column list
    pub fn from_keyword(s: &str) -> Option<DataType> {
        match s.to_lowercase().as_str() {
            "int" => Some(DataType::Integer),
            "string" => Some(DataType::Text),
            _ => None,
        }
    }

    /// Convert a raw literal string to a value of this type.
    ///
    /// Fails with `TypeMismatch` when the literal does not fit, e.g.
    /// non-numeric text supplied for an Integer column.
    pub fn convert(&self, raw: &str, column: &str) -> Result<Value> {
        match self {
            DataType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| Error::TypeMismatch {
                    value: raw.to_string(),
                    column: column.to_string(),
                    expected: self.to_string(),
                }),
            DataType::Text => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Check whether a value already has this type
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (DataType::Integer, Value::Integer(_)) | (DataType::Text, Value::Text(_))
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "int"),
            DataType::Text => write!(f, "string"),
        }
    }
}
