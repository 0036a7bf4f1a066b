//! Executor module
//!
//! Parses command strings and dispatches them against a database.

pub mod executor;

pub use executor::{execute, run, run_to_text, QueryResult};
