use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Lockbox.
#[derive(Debug, Error)]
pub enum LockboxError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Encrypted value is corrupt or was written under a different master password")]
    CorruptToken,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Vault is locked — unlock it with the master password first")]
    NotUnlocked,

    // --- Master password errors ---
    #[error("Master password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,

    #[error("Master password cannot be empty")]
    EmptyPassword,

    #[error("Wrong master password ({remaining} attempt(s) remaining before all records are wiped)")]
    WrongPassword { remaining: u32 },

    #[error("Master password rejected {attempts} times in a row — all protected records were wiped")]
    LockedOutAndWiped { attempts: u32 },

    #[error("Cannot {action} while the vault is {state}")]
    UnexpectedState { action: &'static str, state: String },

    // --- Vault errors ---
    #[error("No vault found in {0} — run `lockbox init` first")]
    VaultNotFound(PathBuf),

    #[error("A master password is already set for this vault")]
    VaultAlreadyInitialized,

    #[error("Record {0} not found")]
    RecordNotFound(i64),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // --- Store errors ---
    #[error("Store error during {operation}: {message}")]
    Store { operation: String, message: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Clipboard error: {0}")]
    ClipboardError(String),
}

impl LockboxError {
    /// Build a `Store` error naming the operation that failed.
    pub fn store(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Store {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Validation failures are re-prompted and never count as an attempt.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::PasswordTooShort { .. } | Self::PasswordMismatch | Self::EmptyPassword
        )
    }
}

/// Convenience type alias for Lockbox results.
pub type Result<T> = std::result::Result<T, LockboxError>;
