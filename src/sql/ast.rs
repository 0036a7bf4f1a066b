//! Abstract syntax tree for the command grammar
//!
//! This module defines the parsed shapes of the six supported commands.

use crate::catalog::DataType;
use std::fmt;

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStatement),
    DropTable(DropTableStatement),
    Insert(InsertStatement),
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

/// A literal value appearing in a command
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "{}", s),
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
}

/// Column definition in CREATE TABLE
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: DataType,
    pub unique: bool,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub table_name: String,
}

/// INSERT statement. Values are positional, matching schema column order.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table_name: String,
    pub values: Vec<Literal>,
}

/// SELECT statement. `filter` and `join` are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table_name: String,
    /// WHERE id = <literal>
    pub filter: Option<Literal>,
    pub join: Option<JoinClause>,
}

/// JOIN <table> ON <left> = <right>
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table_name: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// A table-qualified column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table_name: String,
    pub assignments: Vec<Assignment>,
    /// WHERE id = <literal>
    pub id: Literal,
}

/// A single SET column = value pair
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Literal,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table_name: String,
    /// WHERE id = <literal>
    pub id: Literal,
}
