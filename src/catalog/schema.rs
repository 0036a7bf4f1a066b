//! Schema definitions for flintdb
//!
//! This module defines table schemas and column metadata. The schema is the
//! single source of truth for the on-disk record layout: records are decoded
//! by walking the columns in declared order.

use super::types::DataType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Is this the primary key (`id`) column?
    pub primary_key: bool,
    /// Is this column unique?
    pub unique: bool,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        let primary_key = name == "id";
        Self {
            name,
            data_type,
            primary_key,
            unique: false,
        }
    }

    /// Set the unique flag
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Whether this is the mandatory `id` column
    pub fn is_id(&self) -> bool {
        self.name == "id"
    }
}

/// Table schema: a name plus an ordered sequence of column definitions.
///
/// Immutable once the table is created; there is no ALTER.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
}

impl TableSchema {
    /// Build and validate a schema.
    ///
    /// Every table must declare exactly one `id` column of type int, which
    /// serves as the primary key. Column names must be distinct.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();

        let id_cols: Vec<&Column> = columns.iter().filter(|c| c.is_id()).collect();
        match id_cols.as_slice() {
            [col] if col.data_type == DataType::Integer => {}
            [_] => {
                return Err(Error::SchemaViolation(format!(
                    "table '{}' must declare 'id' with type 'int'",
                    name
                )))
            }
            [] => {
                return Err(Error::SchemaViolation(format!(
                    "table '{}' must include an 'id' column of type 'int'",
                    name
                )))
            }
            _ => {
                return Err(Error::SchemaViolation(format!(
                    "table '{}' declares 'id' more than once",
                    name
                )))
            }
        }

        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::SchemaViolation(format!(
                    "duplicate column '{}' in table '{}'",
                    col.name, name
                )));
            }
        }

        Ok(Self { name, columns })
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns in declared order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns other than `id`, in declared order (the record tail layout)
    pub fn value_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_id())
    }

    /// Unique, non-id columns (those backed by a secondary index)
    pub fn unique_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.unique && !c.is_id())
    }
}
