//! The persisted master-secret row.
//!
//! One row per vault holding the salt, the verifier and the KDF settings
//! they were produced with.  Salt and verifier are stored base64-encoded.
//! Rows written before `kdf_params` existed are read with the default
//! PBKDF2 settings and use the KDF output directly as the session key;
//! such tables gain the column the first time they are opened.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::crypto::{KdfParams, KeySchedule, Verifier};
use crate::errors::{LockboxError, Result};
use crate::store::{Row, Store, Value};

/// Table holding the master-secret row.
pub const MASTER_TABLE: &str = "master_passwords";

/// The stored salt + verifier for a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSecretRecord {
    pub salt: Vec<u8>,
    pub verifier: Vec<u8>,
    pub params: KdfParams,
    pub schedule: KeySchedule,
}

impl From<Verifier> for MasterSecretRecord {
    fn from(v: Verifier) -> Self {
        Self {
            salt: v.salt,
            verifier: v.hash,
            params: v.params,
            schedule: KeySchedule::Expanded,
        }
    }
}

impl MasterSecretRecord {
    fn from_row(row: &Row) -> Result<Self> {
        let salt = decode_column(row, "salt")?;
        let verifier = decode_column(row, "hashed_password")?;
        let (params, schedule) = match row.opt_text("kdf_params")? {
            Some(json) => (KdfParams::from_json(&json)?, KeySchedule::Expanded),
            None => (KdfParams::default(), KeySchedule::Direct),
        };
        Ok(Self {
            salt,
            verifier,
            params,
            schedule,
        })
    }
}

fn decode_column(row: &Row, column: &str) -> Result<Vec<u8>> {
    BASE64.decode(row.text(column)?).map_err(|e| {
        LockboxError::SerializationError(format!("master secret column '{column}': {e}"))
    })
}

/// Create the master-secret table if it does not exist yet, or add the
/// `kdf_params` column to a table that predates it.
pub fn ensure_table(store: &(impl Store + ?Sized)) -> Result<()> {
    if store.table_exists(MASTER_TABLE)? {
        if !has_column(store, "kdf_params")? {
            store.execute(
                &format!("ALTER TABLE {MASTER_TABLE} ADD COLUMN kdf_params TEXT"),
                &[],
            )?;
            tracing::debug!(table = MASTER_TABLE, "added kdf_params column");
        }
        return Ok(());
    }
    store.create_table(
        MASTER_TABLE,
        &[
            ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
            ("salt", "TEXT NOT NULL"),
            ("hashed_password", "TEXT NOT NULL"),
            ("kdf_params", "TEXT"),
            ("created_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
            ("updated_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
        ],
    )
}

fn has_column(store: &(impl Store + ?Sized), column: &str) -> Result<bool> {
    let rows = store.query(&format!("PRAGMA table_info({MASTER_TABLE})"), &[])?;
    for row in &rows {
        if row.text("name")? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Load the master-secret row, if one exists.
pub fn load(store: &(impl Store + ?Sized)) -> Result<Option<MasterSecretRecord>> {
    let rows = store.query(
        &format!("SELECT * FROM {MASTER_TABLE} ORDER BY id LIMIT 1"),
        &[],
    )?;
    rows.first().map(MasterSecretRecord::from_row).transpose()
}

/// Persist a freshly created verifier.
pub fn insert(store: &(impl Store + ?Sized), verifier: &Verifier) -> Result<()> {
    store.execute(
        &format!(
            "INSERT INTO {MASTER_TABLE} (salt, hashed_password, kdf_params) VALUES (?1, ?2, ?3)"
        ),
        &[
            Value::from(BASE64.encode(&verifier.salt)),
            Value::from(BASE64.encode(&verifier.hash)),
            Value::from(verifier.params.to_json()?),
        ],
    )?;
    Ok(())
}

/// Delete the master-secret row(s).
pub fn delete_all(store: &(impl Store + ?Sized)) -> Result<usize> {
    store.execute(&format!("DELETE FROM {MASTER_TABLE}"), &[])
}
