//! SQLite-backed `Store`.
//!
//! Holds one connection for the life of the process.  The database file
//! is created with owner-only permissions on Unix.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};

use crate::errors::{LockboxError, Result};

use super::{validate_identifier, Row, Store, Value};

/// A `Store` over a single SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| LockboxError::store("open database", e))?;

        // Restrict the database to the owner.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        tracing::debug!(path = %path.display(), "opened record database");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| LockboxError::store("open database", e))?;
        Ok(Self { conn })
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl Store for SqliteStore {
    fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(|e| LockboxError::store(format!("check table '{name}'"), e))?;
        Ok(count > 0)
    }

    fn create_table(&self, name: &str, columns: &[(&str, &str)]) -> Result<()> {
        validate_identifier(name)?;
        let mut defs = Vec::with_capacity(columns.len());
        for (column, definition) in columns {
            validate_identifier(column)?;
            defs.push(format!("{column} {definition}"));
        }

        let sql = format!("CREATE TABLE IF NOT EXISTS {name} ({})", defs.join(", "));
        self.conn
            .execute_batch(&sql)
            .map_err(|e| LockboxError::store(format!("create table '{name}'"), e))?;

        tracing::debug!(table = name, "ensured table exists");
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| LockboxError::store("query prepare", e))?;

        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows = stmt
            .query(params_from_iter(params.iter().map(to_sql)))
            .map_err(|e| LockboxError::store("query exec", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| LockboxError::store("query step", e))?
        {
            let mut columns = BTreeMap::new();
            for (idx, name) in names.iter().enumerate() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| LockboxError::store("row parse", e))?;
                columns.insert(name.clone(), from_sql(value));
            }
            out.push(Row::new(columns));
        }

        Ok(out)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.conn
            .execute(sql, params_from_iter(params.iter().map(to_sql)))
            .map_err(|e| LockboxError::store("execute", e))
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.conn.last_insert_rowid())
    }
}
