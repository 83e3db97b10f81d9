//! Master password verifier.
//!
//! A verifier is the KDF output over the real password, stored next to
//! its salt.  Checking a candidate re-runs the same KDF and compares the
//! result in constant time.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::errors::Result;

use super::kdf::{derive_key, generate_salt, KdfParams, KEY_LEN};
use super::keys::SessionKey;

/// Salt and verifier for a freshly chosen master password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verifier {
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
    pub params: KdfParams,
}

/// Generate a fresh salt and compute the verifier for `password`.
pub fn create_verifier(password: &str, params: &KdfParams) -> Result<Verifier> {
    let salt = generate_salt()?;
    let hash = derive_key(password.as_bytes(), &salt, params)?;
    Ok(Verifier {
        salt: salt.to_vec(),
        hash: hash.to_vec(),
        params: *params,
    })
}

/// Check `password` against a stored salt and verifier.
///
/// Returns `Ok(true)` only on an exact match.  The comparison does not
/// short-circuit on the first differing byte.
pub fn check(password: &str, salt: &[u8], verifier: &[u8], params: &KdfParams) -> Result<bool> {
    let mut derived = derive_key(password.as_bytes(), salt, params)?;
    let matches: bool = derived.as_slice().ct_eq(verifier).into();
    derived.zeroize();
    Ok(matches)
}

/// How the session key is obtained from the KDF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySchedule {
    /// The KDF output is the key.  Vaults whose master row carries no
    /// KDF parameters were written this way.
    Direct,
    /// The KDF output is HKDF-expanded, so the stored verifier is never
    /// the key.  Used for every vault this crate creates.
    Expanded,
}

impl KeySchedule {
    fn session_key(self, master: &[u8; KEY_LEN]) -> Result<SessionKey> {
        match self {
            Self::Direct => Ok(SessionKey::new(*master)),
            Self::Expanded => SessionKey::from_master(master),
        }
    }
}

/// Derive the session key for `password` under `salt`.
pub fn derive_session_key(
    password: &str,
    salt: &[u8],
    params: &KdfParams,
    schedule: KeySchedule,
) -> Result<SessionKey> {
    let mut master = derive_key(password.as_bytes(), salt, params)?;
    let key = schedule.session_key(&master);
    master.zeroize();
    key
}

/// Create a verifier and its session key from a single derivation.
pub fn create_with_key(password: &str, params: &KdfParams) -> Result<(Verifier, SessionKey)> {
    let salt = generate_salt()?;
    let mut master = derive_key(password.as_bytes(), &salt, params)?;
    let key = KeySchedule::Expanded.session_key(&master);
    let verifier = Verifier {
        salt: salt.to_vec(),
        hash: master.to_vec(),
        params: *params,
    };
    master.zeroize();
    Ok((verifier, key?))
}

/// Check `password` and, on a match, return its session key.
///
/// The KDF runs once; its output is compared in constant time and then
/// turned into the key.
pub fn unlock_key(
    password: &str,
    salt: &[u8],
    verifier: &[u8],
    params: &KdfParams,
    schedule: KeySchedule,
) -> Result<Option<SessionKey>> {
    let mut master = derive_key(password.as_bytes(), salt, params)?;
    let matches: bool = master.as_slice().ct_eq(verifier).into();
    let key = if matches {
        schedule.session_key(&master).map(Some)
    } else {
        Ok(None)
    };
    master.zeroize();
    key
}
