//! Cryptographic primitives for Lockbox.
//!
//! This module provides:
//! - PBKDF2 / Argon2id password-based key derivation (`kdf`)
//! - The master password verifier (`verifier`)
//! - Session keys and their shared holder (`keys`)
//! - AES-256-CBC and AES-256-GCM encryption (`encryption`)
//! - Printable encrypted tokens and the `CipherBox` (`token`)
//! - A random password generator (`generator`)

pub mod encryption;
pub mod generator;
pub mod kdf;
pub mod keys;
pub mod token;
pub mod verifier;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key, CipherBox, SessionKeyStore, ...};
pub use encryption::CipherScheme;
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use keys::{SessionKey, SessionKeyStore};
pub use token::CipherBox;
pub use verifier::{
    check, create_verifier, create_with_key, derive_session_key, unlock_key, KeySchedule, Verifier,
};
