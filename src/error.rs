//! Error types for flintdb
//!
//! This module defines all error types used throughout the engine.

use thiserror::Error;

/// The main error type for flintdb
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Syntax error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Syntax error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Syntax error: invalid number at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Syntax error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Syntax error: unexpected end of command, expected {0}")]
    UnexpectedEof(String),

    #[error("Syntax error: {0}")]
    SyntaxError(String),

    #[error("Unsupported operation: '{0}'")]
    UnsupportedOperation(String),

    // ========== Catalog Errors ==========
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("Database '{0}' already exists")]
    DatabaseAlreadyExists(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Schema error: {0}")]
    SchemaViolation(String),

    // ========== Type Errors ==========
    #[error("Type mismatch: value '{value}' does not fit column '{column}' of type {expected}")]
    TypeMismatch {
        value: String,
        column: String,
        expected: String,
    },

    // ========== Constraint Errors ==========
    #[error("Duplicate primary key: {0}")]
    DuplicateKey(i64),

    #[error("UNIQUE constraint violation on column '{column}': value '{value}' already exists")]
    UniqueConstraintViolation { column: String, value: String },

    #[error("Record with id {0} not found")]
    RecordNotFound(i64),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for flintdb operations
pub type Result<T> = std::result::Result<T, Error>;
