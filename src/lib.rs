//! flintdb - A minimal durable relational engine written in Rust
//!
//! This library provides the core components of a small row-store database:
//! - Command parsing (lexer, parser, AST)
//! - Row store (binary table files, primary-key offset index, unique sets)
//! - Command dispatch (CRUD + nested-loop equi-join)
//! - Catalog (databases and tables)
//! - TCP server

pub mod catalog;
pub mod error;
pub mod executor;
pub mod server;
pub mod sql;
pub mod storage;

pub use error::{Error, Result};
