//! Master password unlock flow.
//!
//! `UnlockFlow` is the single state machine every encrypted feature goes
//! through before it may touch its records:
//!
//! ```text
//! NoVaultYet ──start──> AwaitingFirstPassword ──setup ok──> Unlocked
//!      │                        └──cancel──> Abandoned
//!      └──start──> AwaitingVerification(n) ──match──> Unlocked
//!                         │  └──cancel──> Cancelled
//!                         └──miss, n+1 < max──> AwaitingVerification(n+1)
//!                         └──miss, n+1 = max──> WipedAndLocked
//! Unlocked ──lock──> AwaitingVerification(0)
//! ```
//!
//! Setup validation failures and empty submissions never consume an
//! attempt.  Once the attempt ceiling is hit, every table registered with
//! `protect` is emptied and the flow is terminal.

pub mod master;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::{create_with_key, unlock_key, KdfParams, SessionKeyStore};
use crate::errors::{LockboxError, Result};
use crate::store::{validate_identifier, Store, Value};

pub use master::{MasterSecretRecord, MASTER_TABLE};

/// What a lockout wipe erases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WipePolicy {
    /// Erase protected records; keep the master-secret row.
    #[default]
    RecordsOnly,
    /// Erase protected records and the master-secret row.
    RecordsAndMasterSecret,
}

/// Policy constants for the unlock flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockPolicy {
    pub min_password_len: usize,
    pub max_attempts: u32,
    pub wipe: WipePolicy,
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        Self {
            min_password_len: 8,
            max_attempts: 5,
            wipe: WipePolicy::default(),
        }
    }
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    NoVaultYet,
    AwaitingFirstPassword,
    AwaitingVerification { attempts_used: u32 },
    Unlocked,
    /// Terminal: the attempt ceiling was reached and records were wiped.
    WipedAndLocked,
    /// Terminal: the user closed the setup prompt.
    Abandoned,
    /// Terminal: the user closed the verification prompt.
    Cancelled,
}

impl UnlockState {
    /// No further submissions are accepted in these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Unlocked | Self::WipedAndLocked | Self::Abandoned | Self::Cancelled
        )
    }
}

impl fmt::Display for UnlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVaultYet => f.write_str("not started"),
            Self::AwaitingFirstPassword => f.write_str("waiting for a new master password"),
            Self::AwaitingVerification { attempts_used } => {
                write!(f, "waiting for the master password ({attempts_used} failed)")
            }
            Self::Unlocked => f.write_str("unlocked"),
            Self::WipedAndLocked => f.write_str("wiped and locked"),
            Self::Abandoned => f.write_str("abandoned"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

fn unexpected(action: &'static str, state: UnlockState) -> LockboxError {
    LockboxError::UnexpectedState {
        action,
        state: state.to_string(),
    }
}

/// The unlock state machine.
///
/// Borrows the backing store and shares the `SessionKeyStore` with the
/// record stores it guards.
pub struct UnlockFlow<'a, S: Store + ?Sized> {
    store: &'a S,
    keys: SessionKeyStore,
    policy: UnlockPolicy,
    kdf: KdfParams,
    protected: Vec<String>,
    record: Option<MasterSecretRecord>,
    state: UnlockState,
}

impl<'a, S: Store + ?Sized> UnlockFlow<'a, S> {
    /// `kdf` is only used when a new master password is set; existing
    /// vaults are verified with the parameters stored alongside them.
    pub fn new(store: &'a S, keys: SessionKeyStore, policy: UnlockPolicy, kdf: KdfParams) -> Self {
        Self {
            store,
            keys,
            policy,
            kdf,
            protected: Vec::new(),
            record: None,
            state: UnlockState::NoVaultYet,
        }
    }

    /// Register a table whose rows are erased on lockout.
    pub fn protect(mut self, table: &str) -> Self {
        if !self.protected.iter().any(|t| t == table) {
            self.protected.push(table.to_string());
        }
        self
    }

    pub fn state(&self) -> UnlockState {
        self.state
    }

    pub fn policy(&self) -> &UnlockPolicy {
        &self.policy
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == UnlockState::Unlocked && self.keys.is_unlocked()
    }

    /// Attempts left before the wipe, while awaiting verification.
    pub fn remaining_attempts(&self) -> Option<u32> {
        match self.state {
            UnlockState::AwaitingVerification { attempts_used } => {
                Some(self.policy.max_attempts.saturating_sub(attempts_used))
            }
            _ => None,
        }
    }

    /// Look for an existing master secret and pick the setup or
    /// verification branch.
    pub fn start(&mut self) -> Result<UnlockState> {
        match self.state {
            UnlockState::NoVaultYet | UnlockState::AwaitingFirstPassword => {}
            other => return Err(unexpected("start unlocking", other)),
        }

        master::ensure_table(self.store)?;
        self.record = master::load(self.store)?;
        self.state = match self.record {
            Some(_) => UnlockState::AwaitingVerification { attempts_used: 0 },
            None => UnlockState::AwaitingFirstPassword,
        };

        tracing::debug!(state = %self.state, "unlock flow started");
        Ok(self.state)
    }

    /// Set the master password for a vault that has none yet.
    ///
    /// On success the verifier is persisted, the session key installed
    /// and the flow is `Unlocked`.  Validation errors leave the state
    /// unchanged.  If persisting fails no key is installed.
    pub fn submit_new_password(&mut self, password: &str, confirmation: &str) -> Result<()> {
        if self.state != UnlockState::AwaitingFirstPassword {
            return Err(unexpected("set a master password", self.state));
        }

        if password.chars().count() < self.policy.min_password_len {
            return Err(LockboxError::PasswordTooShort {
                min: self.policy.min_password_len,
            });
        }
        if password != confirmation {
            return Err(LockboxError::PasswordMismatch);
        }

        let store = self.store;
        let kdf = self.kdf;
        let mut created = None;
        self.keys.install_with(|| {
            if master::load(store)?.is_some() {
                return Err(LockboxError::VaultAlreadyInitialized);
            }
            let (verifier, key) = create_with_key(password, &kdf)?;
            master::insert(store, &verifier)?;
            created = Some(MasterSecretRecord::from(verifier));
            Ok(Some(key))
        })?;

        self.record = created;
        self.state = UnlockState::Unlocked;
        tracing::info!("master password set, vault unlocked");
        Ok(())
    }

    /// Check a candidate master password.
    ///
    /// - match: session key installed, `Unlocked`
    /// - miss below the ceiling: `WrongPassword { remaining }`
    /// - miss at the ceiling: protected tables wiped, `LockedOutAndWiped`
    pub fn submit_password(&mut self, password: &str) -> Result<()> {
        let attempts_used = match self.state {
            UnlockState::AwaitingVerification { attempts_used } => attempts_used,
            other => return Err(unexpected("verify the master password", other)),
        };
        if password.is_empty() {
            return Err(LockboxError::EmptyPassword);
        }
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| unexpected("verify the master password", self.state))?;

        let unlocked = self.keys.install_with(|| {
            unlock_key(
                password,
                &record.salt,
                &record.verifier,
                &record.params,
                record.schedule,
            )
        })?;

        if unlocked {
            self.state = UnlockState::Unlocked;
            tracing::info!("master password verified, vault unlocked");
            return Ok(());
        }

        let used = attempts_used + 1;
        if used >= self.policy.max_attempts {
            self.state = UnlockState::WipedAndLocked;
            self.keys.clear();
            tracing::error!(
                attempts = used,
                "master password rejected too many times, wiping protected records"
            );
            let removed = self.wipe()?;
            tracing::error!(removed, "protected records wiped");
            return Err(LockboxError::LockedOutAndWiped { attempts: used });
        }

        let remaining = self.policy.max_attempts - used;
        self.state = UnlockState::AwaitingVerification {
            attempts_used: used,
        };
        tracing::warn!(attempts = used, remaining, "master password rejected");
        Err(LockboxError::WrongPassword { remaining })
    }

    /// The user closed the prompt.  Never consumes an attempt.
    pub fn cancel(&mut self) -> UnlockState {
        self.state = match self.state {
            UnlockState::NoVaultYet | UnlockState::AwaitingFirstPassword => UnlockState::Abandoned,
            UnlockState::AwaitingVerification { .. } => UnlockState::Cancelled,
            other => other,
        };
        tracing::debug!(state = %self.state, "unlock prompt closed");
        self.state
    }

    /// Drop the session key and go back to awaiting verification.
    pub fn lock(&mut self) {
        self.keys.clear();
        if self.state == UnlockState::Unlocked {
            self.state = match self.record {
                Some(_) => UnlockState::AwaitingVerification { attempts_used: 0 },
                None => UnlockState::NoVaultYet,
            };
            tracing::info!("vault locked");
        }
    }

    /// Erase every protected table and, per policy, the master secret,
    /// as one transaction.
    fn wipe(&self) -> Result<usize> {
        self.store.execute("BEGIN IMMEDIATE", &[])?;
        match self.wipe_tables() {
            Ok(removed) => {
                self.store.execute("COMMIT", &[])?;
                Ok(removed)
            }
            Err(e) => {
                if let Err(rollback) = self.store.execute("ROLLBACK", &[]) {
                    tracing::error!(error = %rollback, "rollback of partial wipe failed");
                }
                Err(e)
            }
        }
    }

    fn wipe_tables(&self) -> Result<usize> {
        let mut removed = 0;
        for table in &self.protected {
            validate_identifier(table)?;
            if !self.store.table_exists(table)? {
                continue;
            }
            removed += self.store.execute(&format!("DELETE FROM {table}"), &[])?;
            if self.store.table_exists("sqlite_sequence")? {
                self.store.execute(
                    "DELETE FROM sqlite_sequence WHERE name = ?1",
                    &[Value::from(table.as_str())],
                )?;
            }
        }

        if self.policy.wipe == WipePolicy::RecordsAndMasterSecret {
            master::delete_all(self.store)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    const FAST: KdfParams = KdfParams::Pbkdf2Sha256 { iterations: 10_000 };

    fn flow(store: &SqliteStore) -> UnlockFlow<'_, SqliteStore> {
        UnlockFlow::new(store, SessionKeyStore::new(), UnlockPolicy::default(), FAST)
    }

    #[test]
    fn fresh_store_asks_for_a_new_password() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut f = flow(&store);
        assert_eq!(f.start().unwrap(), UnlockState::AwaitingFirstPassword);
        assert!(store.table_exists(MASTER_TABLE).unwrap());
    }

    #[test]
    fn validation_errors_keep_the_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut f = flow(&store);
        f.start().unwrap();

        assert!(matches!(
            f.submit_new_password("short12", "short12"),
            Err(LockboxError::PasswordTooShort { min: 8 })
        ));
        assert!(matches!(
            f.submit_new_password("longenough1", "longenough2"),
            Err(LockboxError::PasswordMismatch)
        ));
        assert_eq!(f.state(), UnlockState::AwaitingFirstPassword);
        assert!(master::load(&store).unwrap().is_none());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut f = flow(&store);
        f.start().unwrap();
        // Seven characters, more than eight bytes.
        assert!(f.submit_new_password("pässwör", "pässwör").is_err());
    }

    #[test]
    fn submitting_in_the_wrong_state_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut f = flow(&store);
        assert!(matches!(
            f.submit_password("anything"),
            Err(LockboxError::UnexpectedState { .. })
        ));
        f.start().unwrap();
        assert!(f.submit_password("anything").is_err());
    }

    #[test]
    fn cancel_during_setup_abandons() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut f = flow(&store);
        f.start().unwrap();
        assert_eq!(f.cancel(), UnlockState::Abandoned);
        assert!(f.state().is_terminal());
        assert!(f.submit_new_password("longenough1", "longenough1").is_err());
    }

    #[test]
    fn remaining_attempts_counts_down() {
        let store = SqliteStore::open_in_memory().unwrap();
        let keys = SessionKeyStore::new();
        let mut setup = UnlockFlow::new(&store, keys.clone(), UnlockPolicy::default(), FAST);
        setup.start().unwrap();
        setup.submit_new_password("correct-pw", "correct-pw").unwrap();

        let mut f = flow(&store);
        f.start().unwrap();
        assert_eq!(f.remaining_attempts(), Some(5));
        assert!(matches!(
            f.submit_password("wrong"),
            Err(LockboxError::WrongPassword { remaining: 4 })
        ));
        assert_eq!(f.remaining_attempts(), Some(4));
    }

    #[test]
    fn empty_password_does_not_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut setup = flow(&store);
        setup.start().unwrap();
        setup.submit_new_password("correct-pw", "correct-pw").unwrap();

        let mut f = flow(&store);
        f.start().unwrap();
        assert!(matches!(
            f.submit_password(""),
            Err(LockboxError::EmptyPassword)
        ));
        assert_eq!(
            f.state(),
            UnlockState::AwaitingVerification { attempts_used: 0 }
        );
    }

    #[test]
    fn state_display_is_readable() {
        assert_eq!(UnlockState::Unlocked.to_string(), "unlocked");
        assert_eq!(
            UnlockState::AwaitingVerification { attempts_used: 2 }.to_string(),
            "waiting for the master password (2 failed)"
        );
    }
}
