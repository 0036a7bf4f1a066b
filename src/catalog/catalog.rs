//! Catalog for flintdb
//!
//! A database is a named collection of tables; the registry is a named
//! collection of databases. Both are plain ownership containers: creation,
//! lookup, listing, and drop, with name uniqueness enforced. Structural
//! operations serialize behind each container's lock.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

use super::schema::{Column, TableSchema};
use super::types::DataType;
use crate::error::{Error, Result};
use crate::storage::{Row, Table, Value};

/// A named collection of tables sharing one data directory.
#[derive(Debug)]
pub struct Database {
    name: String,
    data_dir: PathBuf,
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl Database {
    /// Create an empty database rooted at `data_dir`
    pub fn new(name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data_dir: data_dir.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a new table and open its row store. Fails if a table of the
    /// same name already exists.
    pub fn create_table(&self, schema: TableSchema) -> Result<Arc<Table>> {
        let mut tables = self.tables.write().unwrap();

        if tables.contains_key(schema.name()) {
            return Err(Error::TableAlreadyExists(schema.name().to_string()));
        }

        let name = schema.name().to_string();
        let table = Arc::new(Table::open(&self.data_dir, &self.name, schema)?);
        tables.insert(name.clone(), table.clone());

        info!(db = self.name, table = name, "created table");
        Ok(table)
    }

    /// Get a table, failing with `TableNotFound` if absent
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Get a table if it exists
    pub fn get_table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.read().unwrap().get(name).cloned()
    }

    /// List all table names, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop a table: remove it from the catalog and delete its storage
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let mut tables = self.tables.write().unwrap();
        let table = tables
            .remove(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        table.drop_storage()?;
        info!(db = self.name, table = name, "dropped table");
        Ok(())
    }

    /// Fetch all live rows of a named table as column->value mappings
    /// (the transport-facing query surface).
    pub fn all_rows(&self, table_name: &str) -> Result<Vec<IndexMap<String, Value>>> {
        let table = self.table(table_name)?;
        let rows = table.select_all()?;
        Ok(rows.into_iter().map(Row::into_values).collect())
    }
}

/// A named collection of databases.
#[derive(Debug)]
pub struct Registry {
    data_dir: PathBuf,
    databases: RwLock<HashMap<String, Arc<Database>>>,
}

impl Registry {
    /// Create a registry rooted at `data_dir` (created if missing)
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            databases: RwLock::new(HashMap::new()),
        })
    }

    /// Data directory shared by all databases
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create a database, failing if the name is taken
    pub fn create_database(&self, name: &str) -> Result<Arc<Database>> {
        let mut databases = self.databases.write().unwrap();
        if databases.contains_key(name) {
            return Err(Error::DatabaseAlreadyExists(name.to_string()));
        }
        let db = Arc::new(Database::new(name, &self.data_dir));
        databases.insert(name.to_string(), db.clone());
        info!(db = name, "created database");
        Ok(db)
    }

    /// Get a database, failing with `DatabaseNotFound` if absent
    pub fn database(&self, name: &str) -> Result<Arc<Database>> {
        self.get_database(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))
    }

    /// Get a database if it exists
    pub fn get_database(&self, name: &str) -> Option<Arc<Database>> {
        self.databases.read().unwrap().get(name).cloned()
    }

    /// List all database names, sorted
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Create the `default` database with the demo `users`/`orders` tables,
    /// seeding a few rows when the tables are empty. Safe to call on every
    /// startup; existing files are reattached via index rebuild.
    pub fn bootstrap_default(&self) -> Result<Arc<Database>> {
        let db = match self.create_database("default") {
            Ok(db) => db,
            Err(Error::DatabaseAlreadyExists(_)) => self.database("default")?,
            Err(e) => return Err(e),
        };

        let users_schema = TableSchema::new(
            "users",
            vec![
                Column::new("id", DataType::Integer),
                Column::new("username", DataType::Text),
                Column::new("age", DataType::Integer),
            ],
        )?;
        let users = match db.create_table(users_schema) {
            Ok(t) => t,
            Err(Error::TableAlreadyExists(_)) => db.table("users")?,
            Err(e) => return Err(e),
        };

        let orders_schema = TableSchema::new(
            "orders",
            vec![
                Column::new("id", DataType::Integer),
                Column::new("user_id", DataType::Integer),
                Column::new("item", DataType::Text),
            ],
        )?;
        let orders = match db.create_table(orders_schema) {
            Ok(t) => t,
            Err(Error::TableAlreadyExists(_)) => db.table("orders")?,
            Err(e) => return Err(e),
        };

        if users.live_count() == 0 {
            let mut row = Row::new(1);
            row.set("username", Value::from("John Doe"));
            row.set("age", Value::from(25));
            users.insert(row)?;

            let mut row = Row::new(2);
            row.set("username", Value::from("Jane Smith"));
            row.set("age", Value::from(30));
            users.insert(row)?;

            let mut row = Row::new(101);
            row.set("user_id", Value::from(1));
            row.set("item", Value::from("Laptop"));
            orders.insert(row)?;
        }

        Ok(db)
    }
}
