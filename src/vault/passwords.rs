//! Password entries.
//!
//! `PasswordStore` is the CRUD layer over the `passwords` table.  The
//! `encrypted_password` column only ever holds an encrypted token: values
//! pass through the `CipherBox` on the way in and out.  Every other
//! column is stored as-is, which is what makes category filtering and
//! title/username/URL search possible in SQL.

use crate::crypto::CipherBox;
use crate::errors::{LockboxError, Result};
use crate::store::{Row, Store, Value};

use super::record::{
    parse_date, parse_timestamp, Listing, PasswordEntry, PasswordInput, RowFailure, DATE_FORMAT,
    UNREADABLE,
};

/// Table holding password entries.
pub const PASSWORDS_TABLE: &str = "passwords";

/// Table holding the category names offered for entries.
pub const CATEGORIES_TABLE: &str = "categories";

/// Categories seeded into a fresh vault.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Websites",
    "Applications",
    "Bank Accounts",
    "Email",
    "Social Media",
    "Other",
];

const SELECT_COLUMNS: &str = "SELECT id, title, username, encrypted_password, url, category, \
     notes, created_at, updated_at, expires_at, is_favorite FROM passwords";

/// Favourites first, then most recently changed.
const ORDER: &str = "ORDER BY is_favorite DESC, updated_at DESC, id DESC";

/// Narrowing options for `PasswordStore::list`.
#[derive(Debug, Clone, Default)]
pub struct PasswordFilter {
    /// Only entries in this category.
    pub category: Option<String>,
    /// Substring match on title, username or URL (never the password).
    pub search: Option<String>,
}

/// CRUD over password entries with an encrypted password column.
pub struct PasswordStore<'a, S: Store + ?Sized> {
    store: &'a S,
    cipher: CipherBox,
}

impl<'a, S: Store + ?Sized> PasswordStore<'a, S> {
    pub fn new(store: &'a S, cipher: CipherBox) -> Self {
        Self { store, cipher }
    }

    /// Create the entry and category tables if needed, seeding the
    /// default categories the first time.
    pub fn init_schema(&self) -> Result<()> {
        if !self.store.table_exists(PASSWORDS_TABLE)? {
            self.store.create_table(
                PASSWORDS_TABLE,
                &[
                    ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
                    ("title", "TEXT NOT NULL"),
                    ("username", "TEXT"),
                    ("encrypted_password", "TEXT NOT NULL"),
                    ("url", "TEXT"),
                    ("category", "TEXT"),
                    ("notes", "TEXT"),
                    ("created_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
                    ("updated_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
                    ("expires_at", "DATE"),
                    ("is_favorite", "INTEGER DEFAULT 0"),
                ],
            )?;
        }

        if !self.store.table_exists(CATEGORIES_TABLE)? {
            self.store.create_table(
                CATEGORIES_TABLE,
                &[
                    ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
                    ("name", "TEXT NOT NULL UNIQUE"),
                ],
            )?;
            for name in DEFAULT_CATEGORIES {
                self.add_category(name)?;
            }
        }
        Ok(())
    }

    /// Add an entry and return its id.
    pub fn add(&self, input: &PasswordInput) -> Result<i64> {
        input.validate()?;
        let token = self.cipher.encrypt(&input.password)?;

        self.store.execute(
            "INSERT INTO passwords
                (title, username, encrypted_password, url, category, notes, expires_at, is_favorite)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            &[
                Value::from(input.title.trim()),
                Value::from(input.username.trim()),
                Value::from(token),
                Value::from(input.url.trim()),
                Value::from(input.category.as_str()),
                Value::from(input.notes.as_str()),
                Value::from(input.expires_at.map(|d| d.format(DATE_FORMAT).to_string())),
                Value::from(input.is_favorite),
            ],
        )?;
        let id = self.store.last_insert_id()?;

        tracing::debug!(id, "password entry added");
        Ok(id)
    }

    /// Replace every field of entry `id`; bumps `updated_at`.
    pub fn update(&self, id: i64, input: &PasswordInput) -> Result<()> {
        input.validate()?;
        let token = self.cipher.encrypt(&input.password)?;

        let changed = self.store.execute(
            "UPDATE passwords
                SET title = ?1, username = ?2, encrypted_password = ?3, url = ?4,
                    category = ?5, notes = ?6, expires_at = ?7, is_favorite = ?8,
                    updated_at = CURRENT_TIMESTAMP
              WHERE id = ?9",
            &[
                Value::from(input.title.trim()),
                Value::from(input.username.trim()),
                Value::from(token),
                Value::from(input.url.trim()),
                Value::from(input.category.as_str()),
                Value::from(input.notes.as_str()),
                Value::from(input.expires_at.map(|d| d.format(DATE_FORMAT).to_string())),
                Value::from(input.is_favorite),
                Value::from(id),
            ],
        )?;
        if changed == 0 {
            return Err(LockboxError::RecordNotFound(id));
        }

        tracing::debug!(id, "password entry updated");
        Ok(())
    }

    /// Load and decrypt a single entry.
    ///
    /// Unlike `list`, a token that fails to decrypt is an error here.
    pub fn get(&self, id: i64) -> Result<PasswordEntry> {
        self.cipher.require_unlocked()?;
        let rows = self
            .store
            .query(&format!("{SELECT_COLUMNS} WHERE id = ?1"), &[Value::from(id)])?;
        let row = rows.first().ok_or(LockboxError::RecordNotFound(id))?;

        let token = row.text("encrypted_password")?;
        let password = self.cipher.decrypt(&token)?;
        entry_from_row(row, password)
    }

    /// Like `get`, but a password that does not decrypt comes back as
    /// `UNREADABLE`; the flag says whether it decrypted.
    pub fn get_lenient(&self, id: i64) -> Result<(PasswordEntry, bool)> {
        self.cipher.require_unlocked()?;
        let rows = self
            .store
            .query(&format!("{SELECT_COLUMNS} WHERE id = ?1"), &[Value::from(id)])?;
        let row = rows.first().ok_or(LockboxError::RecordNotFound(id))?;

        let token = row.text("encrypted_password")?;
        match self.cipher.decrypt(&token) {
            Ok(password) => Ok((entry_from_row(row, password)?, true)),
            Err(LockboxError::CorruptToken) => {
                tracing::warn!(id, "password entry could not be decrypted");
                Ok((entry_from_row(row, UNREADABLE.to_string())?, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Title of entry `id`, read without decrypting anything.
    pub fn title(&self, id: i64) -> Result<String> {
        self.cipher.require_unlocked()?;
        let rows = self
            .store
            .query("SELECT title FROM passwords WHERE id = ?1", &[Value::from(id)])?;
        rows.first()
            .ok_or(LockboxError::RecordNotFound(id))?
            .text("title")
    }

    /// Delete entry `id`.
    pub fn delete(&self, id: i64) -> Result<()> {
        self.cipher.require_unlocked()?;
        let removed = self
            .store
            .execute("DELETE FROM passwords WHERE id = ?1", &[Value::from(id)])?;
        if removed == 0 {
            return Err(LockboxError::RecordNotFound(id));
        }
        tracing::debug!(id, "password entry deleted");
        Ok(())
    }

    /// List entries, decrypting each password.
    ///
    /// A row whose token does not decrypt is still listed, with the
    /// password replaced by `UNREADABLE`, and is reported in `failures`.
    pub fn list(&self, filter: &PasswordFilter) -> Result<Listing<PasswordEntry>> {
        self.cipher.require_unlocked()?;

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(category) = &filter.category {
            params.push(Value::from(category.as_str()));
            clauses.push(format!("category = ?{}", params.len()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(Value::from(format!("%{}%", escape_like(search))));
                let n = params.len();
                clauses.push(format!(
                    "(title LIKE ?{n} ESCAPE '\\' OR username LIKE ?{n} ESCAPE '\\' \
                      OR url LIKE ?{n} ESCAPE '\\')"
                ));
            }
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(ORDER);

        let mut listing = Listing::default();
        for row in self.store.query(&sql, &params)? {
            let id = row.int("id")?;
            let token = row.text("encrypted_password")?;
            let password = match self.cipher.decrypt(&token) {
                Ok(password) => password,
                Err(LockboxError::CorruptToken) => {
                    tracing::warn!(id, "password entry could not be decrypted");
                    listing.failures.push(RowFailure {
                        id,
                        error: LockboxError::CorruptToken,
                    });
                    UNREADABLE.to_string()
                }
                Err(e) => return Err(e),
            };
            listing.entries.push(entry_from_row(&row, password)?);
        }
        Ok(listing)
    }

    /// Category names, alphabetically.
    pub fn categories(&self) -> Result<Vec<String>> {
        self.store
            .query("SELECT name FROM categories ORDER BY name", &[])?
            .iter()
            .map(|row| row.text("name"))
            .collect()
    }

    /// Add a category; returns `false` if it already existed.
    pub fn add_category(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LockboxError::InvalidRecord(
                "category name cannot be empty".into(),
            ));
        }
        let inserted = self.store.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            &[Value::from(name)],
        )?;
        Ok(inserted > 0)
    }
}

/// Escape `LIKE` wildcards so the term matches literally under `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn entry_from_row(row: &Row, password: String) -> Result<PasswordEntry> {
    Ok(PasswordEntry {
        id: row.int("id")?,
        title: row.text("title")?,
        username: row.opt_text("username")?.unwrap_or_default(),
        password,
        url: row.opt_text("url")?.unwrap_or_default(),
        category: row.opt_text("category")?.unwrap_or_default(),
        notes: row.opt_text("notes")?.unwrap_or_default(),
        created_at: parse_timestamp(row.opt_text("created_at")?),
        updated_at: parse_timestamp(row.opt_text("updated_at")?),
        expires_at: parse_date(row.opt_text("expires_at")?),
        is_favorite: row.opt_int("is_favorite")?.unwrap_or(0) != 0,
    })
}
