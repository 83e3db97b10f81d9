//! Record types returned by the vault stores.
//!
//! Secret fields hold plaintext here; only their persisted form is an
//! encrypted token.  A secret that cannot be decrypted is replaced by
//! `UNREADABLE` in listings and reported in `Listing::failures`.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{LockboxError, Result};

/// Placeholder shown for a secret field that failed to decrypt.
pub const UNREADABLE: &str = "<unreadable>";

/// Format SQLite's `CURRENT_TIMESTAMP` uses.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_timestamp(s: Option<String>) -> Option<NaiveDateTime> {
    s.and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok())
}

pub(crate) fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A row whose secret field could not be decrypted.
#[derive(Debug)]
pub struct RowFailure {
    pub id: i64,
    pub error: LockboxError,
}

/// Result of listing records: every row, plus the ones that only made it
/// in with a placeholder.
#[derive(Debug)]
pub struct Listing<T> {
    pub entries: Vec<T>,
    pub failures: Vec<RowFailure>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Listing<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every row decrypted.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A stored password entry.  `password` is the secret field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub id: i64,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub category: String,
    pub notes: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDate>,
    pub is_favorite: bool,
}

impl PasswordEntry {
    /// Expired once `today` is past the expiry date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_at.is_some_and(|d| today > d)
    }

    /// Copy the editable fields, e.g. to apply changes and `update`.
    pub fn to_input(&self) -> PasswordInput {
        PasswordInput {
            title: self.title.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            url: self.url.clone(),
            category: self.category.clone(),
            notes: self.notes.clone(),
            expires_at: self.expires_at,
            is_favorite: self.is_favorite,
        }
    }
}

/// Fields supplied when adding or updating a password entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordInput {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub category: String,
    pub notes: String,
    pub expires_at: Option<NaiveDate>,
    pub is_favorite: bool,
}

impl PasswordInput {
    /// Title and password are required.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LockboxError::InvalidRecord("title cannot be empty".into()));
        }
        if self.password.is_empty() {
            return Err(LockboxError::InvalidRecord(
                "password cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// A stored date record.  Both `title` and `date` are secret fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRecord {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub created_at: Option<NaiveDateTime>,
}
