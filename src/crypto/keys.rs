//! Session key handling.
//!
//! The session key is what every field-level encrypt/decrypt uses.  It is
//! derived from the master password on unlock, held only in memory inside
//! a `SessionKeyStore`, and zeroed when dropped or when the vault is
//! re-locked.
//!
//! The KDF output itself is also what gets persisted as the verifier, so
//! for new vaults the usable key is expanded from it with HKDF-SHA256
//! under a dedicated label (see `verifier::KeySchedule`).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{LockboxError, Result};

use super::kdf::KEY_LEN;

/// HKDF `info` label binding the expanded key to field encryption.
const SESSION_KEY_INFO: &[u8] = b"lockbox-session-key";

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: [u8; KEY_LEN],
}

impl SessionKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Expand a KDF output into the session key.
    pub fn from_master(master: &[u8; KEY_LEN]) -> Result<Self> {
        let hk = Hkdf::<Sha256>::new(None, master);

        let mut okm = [0u8; KEY_LEN];
        hk.expand(SESSION_KEY_INFO, &mut okm)
            .map_err(|e| LockboxError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

        let key = Self::new(okm);
        okm.zeroize();
        Ok(key)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.bytes[..].ct_eq(&other.bytes[..]).into()
    }
}

impl Eq for SessionKey {}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Shared holder for "the current session key".
///
/// Created once at start-up and handed (cloned) to the unlock flow and to
/// every record store.  Clones share the same slot.  Holds zero or one
/// key; `set` overwrites, `clear` re-locks.
#[derive(Clone, Default)]
pub struct SessionKeyStore {
    slot: Arc<Mutex<Option<SessionKey>>>,
}

impl SessionKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `key`, replacing any previous one.
    pub fn set(&self, key: SessionKey) {
        *self.lock_slot() = Some(key);
    }

    /// Return a copy of the current key, if any.
    pub fn get(&self) -> Option<SessionKey> {
        self.lock_slot().clone()
    }

    /// Return the current key or `NotUnlocked`.
    ///
    /// There is no fallback key: encrypting before unlock is an error.
    pub fn require(&self) -> Result<SessionKey> {
        self.get().ok_or(LockboxError::NotUnlocked)
    }

    /// Drop the current key (it is zeroed on drop).
    pub fn clear(&self) {
        self.lock_slot().take();
    }

    pub fn is_unlocked(&self) -> bool {
        self.lock_slot().is_some()
    }

    /// Run `produce` while holding the slot, installing the key it returns.
    ///
    /// Two unlock attempts sharing this store cannot interleave between
    /// checking the password and installing the key.  Returns whether a
    /// key was installed; on `Ok(None)` or an error the slot is untouched.
    pub fn install_with<F>(&self, produce: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Option<SessionKey>>,
    {
        let mut slot = self.lock_slot();
        match produce()? {
            Some(key) => {
                *slot = Some(key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<SessionKey>> {
        // A panic while holding the guard cannot leave a half-written key.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeyStore")
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}
