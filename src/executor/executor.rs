//! Command executor
//!
//! This module dispatches parsed statements against a database: schema
//! changes go to the catalog, row operations to the table row stores, and
//! SELECT results come back as ordered column-to-value mappings.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{Column, Database, TableSchema};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::parse;
use crate::storage::{Row, Value};

/// The result of executing one command: either a status message or a set
/// of result rows.
#[derive(Debug, Serialize)]
pub struct QueryResult {
    /// Status message (for CREATE/DROP/INSERT/UPDATE/DELETE)
    pub message: Option<String>,
    /// Result rows (for SELECT)
    pub rows: Vec<IndexMap<String, Value>>,
}

impl QueryResult {
    /// Create a result carrying only a status message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            rows: Vec::new(),
        }
    }

    /// Create a result carrying rows
    pub fn with_rows(rows: Vec<IndexMap<String, Value>>) -> Self {
        Self {
            message: None,
            rows,
        }
    }

    /// Render the result for a text transport: the status message, or one
    /// JSON object per row, or a placeholder when a SELECT matched nothing.
    pub fn to_text(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        if self.rows.is_empty() {
            return "No results.".to_string();
        }
        self.rows
            .iter()
            .map(|row| serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse and execute a single command against `db`
pub fn run(db: &Database, command: &str) -> Result<QueryResult> {
    let statement = parse(command)?;
    execute(db, statement)
}

/// Like [`run`], but folds errors into the text response
pub fn run_to_text(db: &Database, command: &str) -> String {
    match run(db, command) {
        Ok(result) => result.to_text(),
        Err(e) => format!("Error: {}", e),
    }
}

/// Execute a parsed statement
pub fn execute(db: &Database, statement: Statement) -> Result<QueryResult> {
    debug!(db = db.name(), ?statement, "executing statement");
    match statement {
        Statement::CreateTable(stmt) => exec_create(db, stmt),
        Statement::DropTable(stmt) => exec_drop(db, stmt),
        Statement::Insert(stmt) => exec_insert(db, stmt),
        Statement::Select(stmt) => exec_select(db, stmt),
        Statement::Update(stmt) => exec_update(db, stmt),
        Statement::Delete(stmt) => exec_delete(db, stmt),
    }
}

fn exec_create(db: &Database, stmt: CreateTableStatement) -> Result<QueryResult> {
    let columns = stmt
        .columns
        .into_iter()
        .map(|spec| Column::new(spec.name, spec.data_type).unique(spec.unique))
        .collect();
    let schema = TableSchema::new(&stmt.table_name, columns)?;
    db.create_table(schema)?;
    Ok(QueryResult::with_message(format!(
        "Table '{}' created.",
        stmt.table_name
    )))
}

fn exec_drop(db: &Database, stmt: DropTableStatement) -> Result<QueryResult> {
    db.drop_table(&stmt.table_name)?;
    Ok(QueryResult::with_message(format!(
        "Table '{}' dropped.",
        stmt.table_name
    )))
}

fn exec_insert(db: &Database, stmt: InsertStatement) -> Result<QueryResult> {
    let table = db.table(&stmt.table_name)?;
    let schema = table.schema();

    if stmt.values.len() != schema.column_count() {
        return Err(Error::SyntaxError(format!(
            "table '{}' has {} columns but {} values were supplied",
            stmt.table_name,
            schema.column_count(),
            stmt.values.len()
        )));
    }

    let mut id = None;
    let mut values = Vec::new();
    for (column, literal) in schema.columns().iter().zip(stmt.values) {
        let value = literal_to_value(&literal, &column.name, &column.data_type)?;
        if column.is_id() {
            match value {
                Value::Integer(n) => id = Some(n),
                // id is always an Integer column; conversion above enforces it
                Value::Text(_) => unreachable!(),
            }
        } else {
            values.push((column.name.clone(), value));
        }
    }
    // Schema validation guarantees an id column exists.
    let id = id.ok_or_else(|| Error::SchemaViolation("missing id value".to_string()))?;

    let mut row = Row::new(id);
    for (name, value) in values {
        row.set(&name, value);
    }
    table.insert(row)?;

    Ok(QueryResult::with_message("Row inserted.".to_string()))
}

fn exec_select(db: &Database, stmt: SelectStatement) -> Result<QueryResult> {
    if let Some(join) = stmt.join {
        return exec_join(db, &stmt.table_name, join);
    }

    let table = db.table(&stmt.table_name)?;

    let rows = match stmt.filter {
        Some(literal) => {
            let id = literal_to_id(&literal)?;
            match table.select_by_id(id)? {
                Some(row) => vec![row],
                None => Vec::new(),
            }
        }
        None => table.select_all()?,
    };

    Ok(QueryResult::with_rows(
        rows.into_iter().map(Row::into_values).collect(),
    ))
}

/// Nested-loop equi-join. Rows pair up only when the referenced values
/// compare equal as typed values; an integer never matches a string.
fn exec_join(db: &Database, left_name: &str, join: JoinClause) -> Result<QueryResult> {
    let left_table = db.table(left_name)?;
    let right_table = db.table(&join.table_name)?;

    // Each side of the ON condition must name one of the two tables.
    let (left_col, right_col) = resolve_join_columns(left_name, &join)?;

    if left_table.schema().get_column(&left_col).is_none() {
        return Err(Error::ColumnNotFound(left_col, left_name.to_string()));
    }
    if right_table.schema().get_column(&right_col).is_none() {
        return Err(Error::ColumnNotFound(right_col, join.table_name.clone()));
    }

    let left_rows = left_table.select_all()?;
    let right_rows = right_table.select_all()?;

    let mut results = Vec::new();
    for left_row in &left_rows {
        let left_value = left_row.get(&left_col);
        for right_row in &right_rows {
            if left_value.is_some() && left_value == right_row.get(&right_col) {
                let mut merged = IndexMap::new();
                for (name, value) in left_row.values() {
                    merged.insert(format!("{}.{}", left_name, name), value.clone());
                }
                for (name, value) in right_row.values() {
                    merged.insert(format!("{}.{}", join.table_name, name), value.clone());
                }
                results.push(merged);
            }
        }
    }

    Ok(QueryResult::with_rows(results))
}

/// Map the ON condition's column references onto the (left, right) tables,
/// accepting either orientation.
fn resolve_join_columns(left_name: &str, join: &JoinClause) -> Result<(String, String)> {
    let JoinClause {
        table_name: right_name,
        left: a,
        right: b,
    } = join;

    if a.table == left_name && &b.table == right_name {
        Ok((a.column.clone(), b.column.clone()))
    } else if &a.table == right_name && b.table == left_name {
        Ok((b.column.clone(), a.column.clone()))
    } else {
        Err(Error::SyntaxError(format!(
            "join condition {} = {} does not reference tables '{}' and '{}'",
            a, b, left_name, right_name
        )))
    }
}

fn exec_update(db: &Database, stmt: UpdateStatement) -> Result<QueryResult> {
    let table = db.table(&stmt.table_name)?;
    let id = literal_to_id(&stmt.id)?;

    let mut row = table
        .select_by_id(id)?
        .ok_or(Error::RecordNotFound(id))?;

    for assignment in stmt.assignments {
        if assignment.column.eq_ignore_ascii_case("id") {
            return Err(Error::SchemaViolation(
                "the id column cannot be updated".to_string(),
            ));
        }
        let column = table
            .schema()
            .get_column(&assignment.column)
            .ok_or_else(|| {
                Error::ColumnNotFound(assignment.column.clone(), stmt.table_name.clone())
            })?;
        let value =
            literal_to_value(&assignment.value, &column.name, &column.data_type)?;
        row.set(&assignment.column, value);
    }

    table.update(row)?;
    Ok(QueryResult::with_message("Row updated.".to_string()))
}

fn exec_delete(db: &Database, stmt: DeleteStatement) -> Result<QueryResult> {
    let table = db.table(&stmt.table_name)?;
    let id = literal_to_id(&stmt.id)?;
    table.delete(id)?;
    Ok(QueryResult::with_message("Row deleted.".to_string()))
}

// ========== Literal conversion ==========

/// Convert a command literal to a typed value for `column`. Numeric text
/// converts to an integer column; integers render as text for a text
/// column; non-numeric text in an integer column is a type error.
fn literal_to_value(
    literal: &Literal,
    column: &str,
    data_type: &crate::catalog::DataType,
) -> Result<Value> {
    use crate::catalog::DataType;
    match (data_type, literal) {
        (DataType::Integer, Literal::Integer(n)) => Ok(Value::Integer(*n)),
        (DataType::Integer, Literal::Text(s)) => data_type.convert(s, column),
        (DataType::Text, Literal::Integer(n)) => Ok(Value::Text(n.to_string())),
        (DataType::Text, Literal::Text(s)) => Ok(Value::Text(s.clone())),
    }
}

/// Convert a WHERE-clause literal to a primary key
fn literal_to_id(literal: &Literal) -> Result<i64> {
    match literal {
        Literal::Integer(n) => Ok(*n),
        Literal::Text(s) => match crate::catalog::DataType::Integer.convert(s, "id")? {
            Value::Integer(n) => Ok(n),
            Value::Text(_) => unreachable!(),
        },
    }
}
