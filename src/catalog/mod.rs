//! Catalog module
//!
//! This module contains schema definitions, data types, and the named
//! collections that own tables and databases.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::{Database, Registry};
pub use schema::{Column, TableSchema};
pub use types::DataType;
