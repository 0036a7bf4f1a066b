//! Row store for flintdb
//!
//! One binary file per table, plus derived in-memory indexes: a primary-key
//! to byte-offset map and one set of in-use values per unique column. The
//! file is a flat, unframed sequence of records in insertion order; the
//! indexes are a cache rebuilt by scanning the file whenever the table is
//! opened.
//!
//! Record layout: a 1-byte live/tombstone flag, the primary key as a
//! little-endian i64, then the remaining columns in schema-declared order,
//! each either a little-endian i64 (int columns) or a u32 length prefix
//! followed by UTF-8 bytes (string columns). There is no header and no
//! framing; the schema is required to decode anything.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use crate::catalog::{DataType, TableSchema};
use crate::error::{Error, Result};
use crate::storage::row::{Row, Value};

const FLAG_LIVE: u8 = 0;
const FLAG_TOMBSTONE: u8 = 1;

/// Derived index state, rebuilt from the file on open.
#[derive(Debug, Default)]
struct Indexes {
    /// id -> byte offset of the record start of the live row
    primary: HashMap<i64, u64>,
    /// unique column name -> set of values held by live rows
    unique: HashMap<String, HashSet<Value>>,
}

impl Indexes {
    fn for_schema(schema: &TableSchema) -> Self {
        let mut unique = HashMap::new();
        for col in schema.unique_columns() {
            unique.insert(col.name.clone(), HashSet::new());
        }
        Self {
            primary: HashMap::new(),
            unique,
        }
    }
}

/// A table's storage unit: one backing file plus its derived indexes.
///
/// Mutations take the write lock for the full read-then-write cycle; reads
/// take the read lock so they never observe a half-applied mutation.
#[derive(Debug)]
pub struct Table {
    schema: TableSchema,
    path: PathBuf,
    indexes: RwLock<Indexes>,
}

/// Strip path-traversal characters from a file name component.
fn sanitize(name: &str) -> String {
    name.replace("..", "").replace(['/', '\\'], "")
}

impl Table {
    /// Open (or create) a table's backing file and rebuild its indexes by
    /// scanning the file from byte 0 to end-of-file.
    pub fn open(data_dir: &Path, db_name: &str, schema: TableSchema) -> Result<Self> {
        let file_name = format!("{}_{}.tbl", sanitize(db_name), sanitize(schema.name()));
        let path = data_dir.join(file_name);

        if !path.exists() {
            File::create(&path)?;
        }

        let table = Self {
            indexes: RwLock::new(Indexes::for_schema(&schema)),
            schema,
            path,
        };
        table.rebuild_indexes()?;
        Ok(table)
    }

    /// Table schema
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild the primary-key and unique-column indexes with one forward
    /// scan. A truncated trailing record is ignored, never a fatal error.
    fn rebuild_indexes(&self) -> Result<()> {
        let mut indexes = self.indexes.write().unwrap();
        *indexes = Indexes::for_schema(&self.schema);

        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut offset: u64 = 0;

        while let Some((row, next_offset)) = decode_record(&mut reader, &self.schema, offset)? {
            if !row.deleted {
                indexes.primary.insert(row.id, offset);
                for (column, set) in indexes.unique.iter_mut() {
                    if let Some(value) = row.get(column) {
                        set.insert(value.clone());
                    }
                }
            }
            offset = next_offset;
        }

        debug!(
            table = self.schema.name(),
            live_rows = indexes.primary.len(),
            "rebuilt indexes"
        );
        Ok(())
    }

    /// Insert a new row. Constraints are checked before any write, so a
    /// rejected insert leaves the file and indexes untouched.
    pub fn insert(&self, row: Row) -> Result<()> {
        let mut indexes = self.indexes.write().unwrap();

        if indexes.primary.contains_key(&row.id) {
            return Err(Error::DuplicateKey(row.id));
        }
        self.check_unique(&indexes, &row, None)?;

        let record = encode_record(&self.schema, &row, FLAG_LIVE)?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(&record)?;
        file.flush()?;

        indexes.primary.insert(row.id, offset);
        Self::index_values(&mut indexes, &row);

        debug!(table = self.schema.name(), id = row.id, offset, "insert");
        Ok(())
    }

    /// Point lookup by primary key: O(1) index probe, then one seek-and-decode.
    ///
    /// Returns `None` both for ids the index has never seen and for ids whose
    /// record turns out to be tombstoned; callers cannot tell "never existed"
    /// from "deleted".
    pub fn select_by_id(&self, id: i64) -> Result<Option<Row>> {
        let indexes = self.indexes.read().unwrap();
        let Some(&offset) = indexes.primary.get(&id) else {
            return Ok(None);
        };

        let row = self.read_row_at(offset)?;
        Ok(row.filter(|r| !r.deleted))
    }

    /// Full scan: decode every record in on-disk order, yield live rows only.
    pub fn select_all(&self) -> Result<Vec<Row>> {
        let _indexes = self.indexes.read().unwrap();

        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut rows = Vec::new();
        let mut offset: u64 = 0;

        while let Some((row, next_offset)) = decode_record(&mut reader, &self.schema, offset)? {
            if !row.deleted {
                rows.push(row);
            }
            offset = next_offset;
        }
        Ok(rows)
    }

    /// Delete a row by flipping its tombstone flag in place. The record's
    /// bytes stay in the file but are never surfaced again; the id may be
    /// reused by a later insert.
    pub fn delete(&self, id: i64) -> Result<()> {
        let mut indexes = self.indexes.write().unwrap();
        let Some(&offset) = indexes.primary.get(&id) else {
            return Err(Error::RecordNotFound(id));
        };

        // Read the full row first so unique values can be retracted.
        let row = self
            .read_row_at(offset)?
            .ok_or(Error::RecordNotFound(id))?;

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_u8(FLAG_TOMBSTONE)?;
        file.flush()?;

        indexes.primary.remove(&id);
        Self::unindex_values(&mut indexes, &row);

        debug!(table = self.schema.name(), id, offset, "delete");
        Ok(())
    }

    /// Replace a row's values, keeping its id. The new values are validated
    /// against the indexes (minus this row's own prior contribution) before
    /// anything is mutated, so a rejected update leaves the original row
    /// fully intact. On success the old record is tombstoned and the new one
    /// appended at a fresh offset.
    pub fn update(&self, row: Row) -> Result<()> {
        let mut indexes = self.indexes.write().unwrap();
        let Some(&old_offset) = indexes.primary.get(&row.id) else {
            return Err(Error::RecordNotFound(row.id));
        };

        let old_row = self
            .read_row_at(old_offset)?
            .ok_or(Error::RecordNotFound(row.id))?;

        // A column may be "updated to itself": only values the row does not
        // already own are checked against the unique sets.
        self.check_unique(&indexes, &row, Some(&old_row))?;
        let record = encode_record(&self.schema, &row, FLAG_LIVE)?;

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(old_offset))?;
        file.write_u8(FLAG_TOMBSTONE)?;
        let new_offset = file.seek(SeekFrom::End(0))?;
        file.write_all(&record)?;
        file.flush()?;

        Self::unindex_values(&mut indexes, &old_row);
        indexes.primary.insert(row.id, new_offset);
        Self::index_values(&mut indexes, &row);

        debug!(
            table = self.schema.name(),
            id = row.id,
            old_offset,
            new_offset,
            "update"
        );
        Ok(())
    }

    /// Delete the backing file and discard all indexes. The table handle is
    /// invalid afterwards.
    pub fn drop_storage(&self) -> Result<()> {
        let mut indexes = self.indexes.write().unwrap();
        indexes.primary.clear();
        indexes.unique.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        debug!(table = self.schema.name(), "dropped storage");
        Ok(())
    }

    /// Number of live rows (size of the primary-key index)
    pub fn live_count(&self) -> usize {
        self.indexes.read().unwrap().primary.len()
    }

    fn read_row_at(&self, offset: u64) -> Result<Option<Row>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file);
        Ok(decode_record(&mut reader, &self.schema, offset)?.map(|(row, _)| row))
    }

    /// Check the unique constraints for `row` against the current indexes,
    /// excluding any values `prior` (the row's old version) already holds.
    fn check_unique(&self, indexes: &Indexes, row: &Row, prior: Option<&Row>) -> Result<()> {
        for col in self.schema.unique_columns() {
            let Some(value) = row.get(&col.name) else {
                continue;
            };
            if let Some(old) = prior {
                if old.get(&col.name) == Some(value) {
                    continue;
                }
            }
            if let Some(set) = indexes.unique.get(&col.name) {
                if set.contains(value) {
                    return Err(Error::UniqueConstraintViolation {
                        column: col.name.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn index_values(indexes: &mut Indexes, row: &Row) {
        for (column, set) in indexes.unique.iter_mut() {
            if let Some(value) = row.get(column) {
                set.insert(value.clone());
            }
        }
    }

    fn unindex_values(indexes: &mut Indexes, row: &Row) {
        for (column, set) in indexes.unique.iter_mut() {
            if let Some(value) = row.get(column) {
                set.remove(value);
            }
        }
    }

    /// Snapshot of the index state, for rebuild-idempotence tests.
    #[cfg(test)]
    pub(crate) fn index_snapshot(
        &self,
    ) -> (
        std::collections::BTreeMap<i64, u64>,
        std::collections::BTreeMap<String, std::collections::BTreeSet<String>>,
    ) {
        let indexes = self.indexes.read().unwrap();
        let primary = indexes.primary.iter().map(|(k, v)| (*k, *v)).collect();
        let unique = indexes
            .unique
            .iter()
            .map(|(col, set)| {
                (
                    col.clone(),
                    set.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        (primary, unique)
    }
}

/// Treat end-of-file as a clean stop instead of an error.
fn eof_as_none<T>(res: io::Result<T>) -> Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Decode one record starting at `offset`, returning the row (tombstoned or
/// not) and the offset of the next record. Returns `None` at end-of-file and
/// for a truncated trailing record.
fn decode_record<R: Read>(
    reader: &mut R,
    schema: &TableSchema,
    offset: u64,
) -> Result<Option<(Row, u64)>> {
    let Some(flag) = eof_as_none(reader.read_u8())? else {
        return Ok(None);
    };
    let Some(id) = eof_as_none(reader.read_i64::<LittleEndian>())? else {
        return Ok(None);
    };

    let mut row = Row::new(id);
    row.deleted = flag != FLAG_LIVE;
    let mut consumed = (1 + 8) as u64;

    for col in schema.value_columns() {
        match col.data_type {
            DataType::Integer => {
                let Some(v) = eof_as_none(reader.read_i64::<LittleEndian>())? else {
                    return Ok(None);
                };
                row.set(&col.name, Value::Integer(v));
                consumed += 8;
            }
            DataType::Text => {
                let Some(len) = eof_as_none(reader.read_u32::<LittleEndian>())? else {
                    return Ok(None);
                };
                let mut buf = vec![0u8; len as usize];
                if eof_as_none(reader.read_exact(&mut buf))?.is_none() {
                    return Ok(None);
                }
                let text = String::from_utf8(buf).map_err(|e| {
                    Error::IoError(io::Error::new(io::ErrorKind::InvalidData, e))
                })?;
                row.set(&col.name, Value::Text(text));
                consumed += 4 + len as u64;
            }
        }
    }

    Ok(Some((row, offset + consumed)))
}

/// Encode a row as one record with the given flag byte. Fails without any
/// side effects when a column is missing or holds a wrongly typed value.
fn encode_record(schema: &TableSchema, row: &Row, flag: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_u8(flag)?;
    buf.write_i64::<LittleEndian>(row.id)?;

    for col in schema.value_columns() {
        let value = row.get(&col.name).ok_or_else(|| {
            Error::SchemaViolation(format!(
                "row {} is missing column '{}'",
                row.id, col.name
            ))
        })?;
        match (col.data_type, value) {
            (DataType::Integer, Value::Integer(v)) => {
                buf.write_i64::<LittleEndian>(*v)?;
            }
            (DataType::Text, Value::Text(s)) => {
                buf.write_u32::<LittleEndian>(s.len() as u32)?;
                buf.extend_from_slice(s.as_bytes());
            }
            (expected, value) => {
                return Err(Error::TypeMismatch {
                    value: value.to_string(),
                    column: col.name.clone(),
                    expected: expected.to_string(),
                });
            }
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;
    use tempfile::TempDir;

    fn users_schema() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                Column::new("id", DataType::Integer),
                Column::new("username", DataType::Text).unique(true),
                Column::new("age", DataType::Integer),
            ],
        )
        .unwrap()
    }

    fn user_row(id: i64, name: &str, age: i64) -> Row {
        let mut row = Row::new(id);
        row.set("username", Value::from(name));
        row.set("age", Value::from(age));
        row
    }

    #[test]
    fn test_insert_select_round_trip() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        let row = user_row(1, "alice", 30);
        table.insert(row.clone()).unwrap();

        let fetched = table.select_by_id(1).unwrap().unwrap();
        assert_eq!(fetched, row);
        assert!(table.select_by_id(2).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        let len_before = fs::metadata(table.path()).unwrap().len();

        let err = table.insert(user_row(1, "bob", 40)).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(1)));

        // File and prior row untouched
        assert_eq!(fs::metadata(table.path()).unwrap().len(), len_before);
        let row = table.select_by_id(1).unwrap().unwrap();
        assert_eq!(row.get("username"), Some(&Value::Text("alice".into())));
    }

    #[test]
    fn test_unique_constraint_rejected() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        let err = table.insert(user_row(2, "alice", 25)).unwrap_err();
        assert!(matches!(
            err,
            Error::UniqueConstraintViolation { ref column, .. } if column == "username"
        ));

        assert_eq!(table.live_count(), 1);
        assert_eq!(table.select_all().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_tombstones_without_shrinking_file() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        table.insert(user_row(2, "bob", 40)).unwrap();
        let len_before = fs::metadata(table.path()).unwrap().len();

        table.delete(1).unwrap();

        assert_eq!(fs::metadata(table.path()).unwrap().len(), len_before);
        assert!(table.select_by_id(1).unwrap().is_none());
        let rows = table.select_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);

        let err = table.delete(1).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(1)));
    }

    #[test]
    fn test_deleted_id_and_unique_value_reusable() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        table.delete(1).unwrap();

        // Both the id and the retracted unique value are free again
        table.insert(user_row(1, "alice", 31)).unwrap();
        let row = table.select_by_id(1).unwrap().unwrap();
        assert_eq!(row.get("age"), Some(&Value::Integer(31)));
    }

    #[test]
    fn test_update_replaces_row() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        table.update(user_row(1, "alicia", 31)).unwrap();

        let row = table.select_by_id(1).unwrap().unwrap();
        assert_eq!(row.get("username"), Some(&Value::Text("alicia".into())));
        assert_eq!(row.get("age"), Some(&Value::Integer(31)));

        // The old unique value was retracted
        table.insert(user_row(2, "alice", 20)).unwrap();
    }

    #[test]
    fn test_update_to_own_value_is_allowed() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        // No-op on the unique column must succeed
        table.update(user_row(1, "alice", 99)).unwrap();

        let row = table.select_by_id(1).unwrap().unwrap();
        assert_eq!(row.get("age"), Some(&Value::Integer(99)));
    }

    #[test]
    fn test_update_atomic_on_constraint_failure() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        table.insert(user_row(2, "bob", 40)).unwrap();

        let err = table.update(user_row(2, "alice", 41)).unwrap_err();
        assert!(matches!(err, Error::UniqueConstraintViolation { .. }));

        // The original row survives fully intact
        let row = table.select_by_id(2).unwrap().unwrap();
        assert_eq!(row.get("username"), Some(&Value::Text("bob".into())));
        assert_eq!(row.get("age"), Some(&Value::Integer(40)));
    }

    #[test]
    fn test_update_missing_row() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();
        let err = table.update(user_row(9, "ghost", 0)).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(9)));
    }

    #[test]
    fn test_reopen_rebuilds_identical_indexes() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();

        table.insert(user_row(1, "alice", 30)).unwrap();
        table.insert(user_row(2, "bob", 40)).unwrap();
        table.insert(user_row(3, "carol", 50)).unwrap();
        table.delete(2).unwrap();
        table.update(user_row(3, "carola", 51)).unwrap();

        let before = table.index_snapshot();
        let rows_before = table.select_all().unwrap();

        let reopened = Table::open(dir.path(), "testdb", users_schema()).unwrap();
        assert_eq!(reopened.index_snapshot(), before);
        assert_eq!(reopened.select_all().unwrap(), rows_before);
    }

    #[test]
    fn test_truncated_trailing_record_ignored() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();
        table.insert(user_row(1, "alice", 30)).unwrap();
        let good_len = fs::metadata(table.path()).unwrap().len();

        // Append a torn record: flag + id, then nothing
        let mut file = OpenOptions::new().append(true).open(table.path()).unwrap();
        file.write_u8(FLAG_LIVE).unwrap();
        file.write_i64::<LittleEndian>(7).unwrap();
        drop(file);
        assert!(fs::metadata(table.path()).unwrap().len() > good_len);

        let reopened = Table::open(dir.path(), "testdb", users_schema()).unwrap();
        assert_eq!(reopened.live_count(), 1);
        assert!(reopened.select_by_id(7).unwrap().is_none());
        assert_eq!(reopened.select_all().unwrap().len(), 1);
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "testdb", users_schema()).unwrap();
        table.insert(user_row(1, "alice", 30)).unwrap();

        let path = table.path().to_path_buf();
        assert!(path.exists());
        table.drop_storage().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_file_name_sanitization() {
        let dir = TempDir::new().unwrap();
        let table = Table::open(dir.path(), "../evil", users_schema()).unwrap();
        // The backing file must stay inside the data directory
        assert!(table.path().starts_with(dir.path()));
        assert_eq!(
            table.path().file_name().unwrap().to_str().unwrap(),
            "evil_users.tbl"
        );
    }
}
