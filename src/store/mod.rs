//! Persistence collaborator.
//!
//! The vault core only needs four logical operations from its backing
//! store: check/create a table, run a parameterized query, and run a
//! parameterized statement.  `Store` captures exactly that, so the unlock
//! flow and the record stores can run against SQLite or a test double.

pub mod sqlite;

use std::collections::BTreeMap;

use crate::errors::{LockboxError, Result};

pub use sqlite::SqliteStore;

/// A single SQL value, used for both parameters and result columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One result row, addressed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(columns: BTreeMap<String, Value>) -> Self {
        Self { columns }
    }

    /// Raw access; `None` when the column is not in the row at all.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Optional text column.  Missing and NULL both read as `None`.
    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.columns.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::Integer(i)) => Ok(Some(i.to_string())),
            Some(other) => Err(column_type_error(column, "text", other)),
        }
    }

    /// Required text column.
    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)?
            .ok_or_else(|| LockboxError::store("read row", format!("column '{column}' is NULL")))
    }

    /// Optional integer column.
    pub fn opt_int(&self, column: &str) -> Result<Option<i64>> {
        match self.columns.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(column_type_error(column, "integer", other)),
        }
    }

    /// Required integer column.
    pub fn int(&self, column: &str) -> Result<i64> {
        self.opt_int(column)?
            .ok_or_else(|| LockboxError::store("read row", format!("column '{column}' is NULL")))
    }
}

fn column_type_error(column: &str, expected: &str, found: &Value) -> LockboxError {
    LockboxError::store(
        "read row",
        format!("column '{column}' should be {expected}, found {found:?}"),
    )
}

/// The operations the vault core issues against its backing store.
pub trait Store {
    /// Whether a table named `name` exists.
    fn table_exists(&self, name: &str) -> Result<bool>;

    /// Create `name` with `(column, definition)` pairs if it does not exist.
    fn create_table(&self, name: &str, columns: &[(&str, &str)]) -> Result<()>;

    /// Run a parameterized query and return every row.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a parameterized statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Row id of the most recent successful insert.
    fn last_insert_id(&self) -> Result<i64> {
        let rows = self.query("SELECT last_insert_rowid() AS id", &[])?;
        rows.first()
            .ok_or_else(|| LockboxError::store("last insert id", "no row returned"))?
            .int("id")
    }
}

/// Table and column names are interpolated into SQL, so only plain
/// identifiers are allowed.
pub fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(LockboxError::store(
            "validate identifier",
            format!("'{name}' is not a valid table or column name"),
        ))
    }
}
