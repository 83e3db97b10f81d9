//! Date records: a title and a free-text date, both encrypted.
//!
//! Since neither column is readable by SQL, listing decrypts every row
//! and sorts in memory, newest date first.

use std::cmp::Ordering;

use chrono::Utc;

use crate::crypto::CipherBox;
use crate::errors::{LockboxError, Result};
use crate::store::{Row, Store, Value};

use super::record::{format_timestamp, parse_timestamp, DateRecord, Listing, RowFailure, UNREADABLE};

/// Table holding date records.
pub const DATES_TABLE: &str = "date_records";

/// CRUD over date records with encrypted title and date columns.
pub struct DateStore<'a, S: Store + ?Sized> {
    store: &'a S,
    cipher: CipherBox,
}

impl<'a, S: Store + ?Sized> DateStore<'a, S> {
    pub fn new(store: &'a S, cipher: CipherBox) -> Self {
        Self { store, cipher }
    }

    pub fn init_schema(&self) -> Result<()> {
        if self.store.table_exists(DATES_TABLE)? {
            return Ok(());
        }
        self.store.create_table(
            DATES_TABLE,
            &[
                ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
                ("title", "TEXT NOT NULL"),
                ("date", "TEXT NOT NULL"),
                ("created_at", "TEXT NOT NULL"),
            ],
        )
    }

    /// Add a record and return its id.
    pub fn add(&self, title: &str, date: &str) -> Result<i64> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LockboxError::InvalidRecord("title cannot be empty".into()));
        }
        let title_token = self.cipher.encrypt(title)?;
        let date_token = self.cipher.encrypt(date.trim())?;
        let created_at = format_timestamp(Utc::now().naive_utc());

        self.store.execute(
            "INSERT INTO date_records (title, date, created_at) VALUES (?1, ?2, ?3)",
            &[
                Value::from(title_token),
                Value::from(date_token),
                Value::from(created_at),
            ],
        )?;
        let id = self.store.last_insert_id()?;

        tracing::debug!(id, "date record added");
        Ok(id)
    }

    /// List every record, newest date first.  Rows that do not decrypt
    /// are listed last with placeholders and reported in `failures`.
    pub fn list(&self) -> Result<Listing<DateRecord>> {
        self.cipher.require_unlocked()?;

        let mut listing = Listing::default();
        let mut readable = Vec::new();
        let mut unreadable = Vec::new();
        for row in self
            .store
            .query("SELECT id, title, date, created_at FROM date_records ORDER BY id", &[])?
        {
            let (record, error) = self.decrypt_row(&row)?;
            match error {
                None => readable.push(record),
                Some(error) => {
                    tracing::warn!(id = record.id, "date record could not be decrypted");
                    listing.failures.push(RowFailure {
                        id: record.id,
                        error,
                    });
                    unreadable.push(record);
                }
            }
        }

        readable.sort_by(newest_first);
        listing.entries = readable;
        listing.entries.extend(unreadable);
        Ok(listing)
    }

    /// Delete record `id`.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.cipher.require_unlocked()?;
        let removed = self
            .store
            .execute("DELETE FROM date_records WHERE id = ?1", &[Value::from(id)])?;
        if removed == 0 {
            return Err(LockboxError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Delete every record; returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        self.cipher.require_unlocked()?;
        let removed = self.store.execute("DELETE FROM date_records", &[])?;
        tracing::debug!(removed, "date records cleared");
        Ok(removed)
    }

    /// Decrypt one row; a corrupt field becomes `UNREADABLE`.
    fn decrypt_row(&self, row: &Row) -> Result<(DateRecord, Option<LockboxError>)> {
        let mut failure = None;
        let mut field = |column: &str| -> Result<String> {
            let token = row.text(column)?;
            match self.cipher.decrypt(&token) {
                Ok(value) => Ok(value),
                Err(LockboxError::CorruptToken) => {
                    failure = Some(LockboxError::CorruptToken);
                    Ok(UNREADABLE.to_string())
                }
                Err(e) => Err(e),
            }
        };
        let title = field("title")?;
        let date = field("date")?;

        let record = DateRecord {
            id: row.int("id")?,
            title,
            date,
            created_at: parse_timestamp(row.opt_text("created_at")?),
        };
        Ok((record, failure))
    }
}

/// Dates compare as text, which orders ISO dates correctly; ties fall
/// back to the most recently added record.
fn newest_first(a: &DateRecord, b: &DateRecord) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherScheme, SessionKey, SessionKeyStore};
    use crate::store::SqliteStore;

    fn store(db: &SqliteStore) -> DateStore<'_, SqliteStore> {
        let keys = SessionKeyStore::new();
        keys.set(SessionKey::new([0x44u8; 32]));
        let s = DateStore::new(db, CipherBox::new(keys, CipherScheme::AesCbc));
        s.init_schema().unwrap();
        s
    }

    #[test]
    fn lists_newest_date_first() {
        let db = SqliteStore::open_in_memory().unwrap();
        let dates = store(&db);
        dates.add("older", "2023-01-01").unwrap();
        dates.add("newer", "2024-06-30").unwrap();
        dates.add("middle", "2023-12-24").unwrap();

        let titles: Vec<String> = dates
            .list()
            .unwrap()
            .entries
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["newer", "middle", "older"]);
    }

    #[test]
    fn both_columns_are_encrypted() {
        let db = SqliteStore::open_in_memory().unwrap();
        let dates = store(&db);
        dates.add("anniversary", "2020-02-02").unwrap();

        let rows = db.query("SELECT title, date FROM date_records", &[]).unwrap();
        assert_ne!(rows[0].text("title").unwrap(), "anniversary");
        assert_ne!(rows[0].text("date").unwrap(), "2020-02-02");
    }

    #[test]
    fn clear_and_delete() {
        let db = SqliteStore::open_in_memory().unwrap();
        let dates = store(&db);
        let id = dates.add("a", "2024-01-01").unwrap();
        dates.add("b", "2024-01-02").unwrap();

        dates.delete(id).unwrap();
        assert!(matches!(dates.delete(id), Err(LockboxError::RecordNotFound(_))));
        assert_eq!(dates.clear().unwrap(), 1);
        assert!(dates.list().unwrap().is_empty());
    }
}
