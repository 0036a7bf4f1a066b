//! Storage module
//!
//! This module contains the row store: per-table binary files plus their
//! derived in-memory indexes, and the row/value types they traffic in.

pub mod row;
pub mod table;

pub use row::{Row, Value};
pub use table::Table;
