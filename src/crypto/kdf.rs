//! Password-based key derivation.
//!
//! Two slow, salted KDFs are supported:
//! - PBKDF2-HMAC-SHA256 (the default, 100 000 iterations)
//! - Argon2id (memory-hard, opt-in via `.lockbox.toml`)
//!
//! The parameters used for a vault are persisted next to its verifier,
//! so a later unlock always re-derives with exactly the same settings.

use argon2::{Algorithm, Argon2, Params, Version};
use hmac::Hmac;
use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::errors::{LockboxError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Minimum PBKDF2 iteration count accepted.
const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Minimum safe Argon2 memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// KDF algorithm and cost parameters.
///
/// Serialized as JSON into the master-secret row, e.g.
/// `{"algorithm":"pbkdf2-sha256","iterations":100000}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum KdfParams {
    Pbkdf2Sha256 {
        iterations: u32,
    },
    Argon2id {
        /// Memory cost in KiB.
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::Pbkdf2Sha256 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Reject parameters too weak to slow down an offline guesser.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Pbkdf2Sha256 { iterations } => {
                if iterations < MIN_PBKDF2_ITERATIONS {
                    return Err(LockboxError::KeyDerivationFailed(format!(
                        "PBKDF2 iterations must be at least {MIN_PBKDF2_ITERATIONS} (got {iterations})"
                    )));
                }
            }
            Self::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => {
                if memory_kib < MIN_MEMORY_KIB {
                    return Err(LockboxError::KeyDerivationFailed(format!(
                        "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {memory_kib})"
                    )));
                }
                if iterations < 1 {
                    return Err(LockboxError::KeyDerivationFailed(
                        "Argon2 iterations must be at least 1".into(),
                    ));
                }
                if parallelism < 1 {
                    return Err(LockboxError::KeyDerivationFailed(
                        "Argon2 parallelism must be at least 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Encode for storage in the master-secret row.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LockboxError::SerializationError(e.to_string()))
    }

    /// Decode from the master-secret row.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| LockboxError::SerializationError(format!("invalid KDF params: {e}")))
    }
}

/// Derive a 32-byte key from a password and salt.
///
/// Deterministic: the same password + salt + params always produce the
/// same key.
pub fn derive_key(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<[u8; KEY_LEN]> {
    if password.is_empty() {
        return Err(LockboxError::KeyDerivationFailed(
            "password must not be empty".into(),
        ));
    }
    if salt.is_empty() {
        return Err(LockboxError::KeyDerivationFailed(
            "salt must not be empty".into(),
        ));
    }
    params.validate()?;

    let mut key = [0u8; KEY_LEN];
    match *params {
        KdfParams::Pbkdf2Sha256 { iterations } => {
            pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut key).map_err(|e| {
                LockboxError::KeyDerivationFailed(format!("PBKDF2 failed: {e}"))
            })?;
        }
        KdfParams::Argon2id {
            memory_kib,
            iterations,
            parallelism,
        } => {
            let params = Params::new(memory_kib, iterations, parallelism, Some(KEY_LEN)).map_err(
                |e| LockboxError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")),
            )?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password_into(password, salt, &mut key)
                .map_err(|e| {
                    LockboxError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}"))
                })?;
        }
    }

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| LockboxError::KeyDerivationFailed(format!("OS randomness unavailable: {e}")))?;
    Ok(salt)
}
