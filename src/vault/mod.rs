//! Vault module — encrypted record storage.
//!
//! This module provides:
//! - Record types and listing results (`record`)
//! - Password entries with an encrypted password column (`passwords`)
//! - Date records with encrypted title and date (`dates`)
//!
//! Both stores read the session key through a shared `CipherBox`, so they
//! only work once the unlock flow has installed a key.

pub mod dates;
pub mod passwords;
pub mod record;

// Re-export the most commonly used items.
pub use dates::{DateStore, DATES_TABLE};
pub use passwords::{PasswordFilter, PasswordStore, CATEGORIES_TABLE, PASSWORDS_TABLE};
pub use record::{
    DateRecord, Listing, PasswordEntry, PasswordInput, RowFailure, DATE_FORMAT, UNREADABLE,
};
