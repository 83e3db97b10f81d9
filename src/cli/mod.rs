//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{CipherBox, SessionKeyStore};
use crate::errors::{LockboxError, Result};
use crate::store::SqliteStore;
use crate::unlock::{UnlockFlow, UnlockState};
use crate::vault::{DateStore, PasswordStore, DATES_TABLE, PASSWORDS_TABLE};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "LOCKBOX_PASSWORD";

/// Lockbox CLI: local encrypted password and date-record vault.
#[derive(Parser)]
#[command(
    name = "lockbox",
    about = "Local encrypted password and date-record vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file (default: `database` from .lockbox.toml, else lockbox.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault and set its master password
    Init,

    /// Add a password entry
    Add {
        /// Entry title (e.g. "Bank")
        title: String,
        #[command(flatten)]
        fields: EntryFields,
    },

    /// Show a password entry
    Get {
        /// Entry id
        id: i64,
        /// Copy the password to the clipboard instead of printing it
        #[arg(short, long)]
        copy: bool,
    },

    /// List password entries
    List {
        /// Only entries in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Match title, username or URL
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Change fields of a password entry
    Edit {
        /// Entry id
        id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: EntryFields,
        /// Remove the favourite mark
        #[arg(long, conflicts_with = "favorite")]
        unfavorite: bool,
        /// Remove the expiry date
        #[arg(long, conflicts_with = "expires")]
        no_expiry: bool,
    },

    /// Delete a password entry
    Delete {
        /// Entry id
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List categories, or add one
    Categories {
        /// Category to add
        #[arg(long)]
        add: Option<String>,
    },

    /// Generate a random password
    Generate {
        #[command(flatten)]
        options: GenerateArgs,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
    },

    /// Manage date records
    Dates {
        #[command(subcommand)]
        action: DatesAction,
    },
}

/// Optional fields shared by `add` and `edit`.
#[derive(clap::Args, Debug, Default)]
pub struct EntryFields {
    /// Username or login
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (omit for interactive prompt)
    #[arg(short, long)]
    pub password: Option<String>,
    /// Generate a random password instead of prompting
    #[arg(short, long, conflicts_with = "password")]
    pub generate: bool,
    /// Website or application URL
    #[arg(long)]
    pub url: Option<String>,
    /// Category (see `lockbox categories`)
    #[arg(short, long)]
    pub category: Option<String>,
    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Expiry date, YYYY-MM-DD
    #[arg(short, long)]
    pub expires: Option<String>,
    /// Mark as favourite
    #[arg(short, long)]
    pub favorite: bool,
}

/// Password generator switches.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct GenerateArgs {
    /// Password length
    #[arg(short, long, default_value = "16")]
    pub length: usize,
    /// Leave out uppercase letters
    #[arg(long)]
    pub no_uppercase: bool,
    /// Leave out lowercase letters
    #[arg(long)]
    pub no_lowercase: bool,
    /// Leave out digits
    #[arg(long)]
    pub no_digits: bool,
    /// Leave out symbols
    #[arg(long)]
    pub no_symbols: bool,
    /// Allow characters like l, 1, O and 0
    #[arg(long)]
    pub allow_look_alikes: bool,
}

/// Dates subcommands.
#[derive(clap::Subcommand)]
pub enum DatesAction {
    /// Add a date record
    Add {
        /// What the date is for
        title: String,
        /// The date (YYYY-MM-DD sorts best)
        date: String,
    },

    /// List date records, newest first
    List,

    /// Delete a date record
    Delete {
        /// Record id
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete every date record
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// An open vault database plus the session key shared by its stores.
pub struct Vault {
    pub settings: Settings,
    pub path: PathBuf,
    pub store: SqliteStore,
    pub keys: SessionKeyStore,
}

impl Vault {
    /// Open (creating if needed) the database for `init`.
    pub fn create(cli: &Cli) -> Result<Self> {
        let (settings, path) = resolve(cli)?;
        Self::open_at(settings, path)
    }

    /// Open an existing database; fails with `VaultNotFound` if the file
    /// is missing.
    pub fn open(cli: &Cli) -> Result<Self> {
        let (settings, path) = resolve(cli)?;
        if !path.exists() {
            return Err(LockboxError::VaultNotFound(path));
        }
        Self::open_at(settings, path)
    }

    fn open_at(settings: Settings, path: PathBuf) -> Result<Self> {
        let store = SqliteStore::open(&path)?;
        let vault = Self {
            settings,
            path,
            store,
            keys: SessionKeyStore::new(),
        };
        vault.passwords().init_schema()?;
        vault.dates().init_schema()?;
        Ok(vault)
    }

    /// A fresh unlock flow guarding both record tables.
    pub fn unlock_flow(&self) -> UnlockFlow<'_, SqliteStore> {
        UnlockFlow::new(
            &self.store,
            self.keys.clone(),
            self.settings.unlock_policy(),
            self.settings.kdf_params(),
        )
        .protect(PASSWORDS_TABLE)
        .protect(DATES_TABLE)
    }

    pub fn cipher(&self) -> CipherBox {
        CipherBox::new(self.keys.clone(), self.settings.cipher)
    }

    pub fn passwords(&self) -> PasswordStore<'_, SqliteStore> {
        PasswordStore::new(&self.store, self.cipher())
    }

    pub fn dates(&self) -> DateStore<'_, SqliteStore> {
        DateStore::new(&self.store, self.cipher())
    }
}

/// Settings from the working directory plus the database path, with
/// `--db` taking precedence.
fn resolve(cli: &Cli) -> Result<(Settings, PathBuf)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let path = match &cli.db {
        Some(db) => cwd.join(db),
        None => settings.database_path(&cwd),
    };
    Ok((settings, path))
}

/// Open the vault and run the verification branch of the unlock flow.
///
/// With `LOCKBOX_PASSWORD` set there is exactly one attempt.  Otherwise
/// the user is prompted until the password matches, the attempts run out
/// or the prompt is closed.
pub fn unlock(cli: &Cli) -> Result<Vault> {
    let vault = Vault::open(cli)?;
    verify(&vault)?;
    Ok(vault)
}

fn verify(vault: &Vault) -> Result<()> {
    let mut flow = vault.unlock_flow();
    if flow.start()? == UnlockState::AwaitingFirstPassword {
        flow.cancel();
        output::tip("Run `lockbox init` to set a master password.");
        return Err(LockboxError::VaultNotFound(vault.path.clone()));
    }

    if let Some(password) = password_from_env() {
        return flow.submit_password(&password);
    }

    loop {
        let password = match prompt("Master password") {
            Ok(pw) => pw,
            Err(e) => {
                flow.cancel();
                tracing::debug!(error = %e, "password prompt closed");
                return Err(LockboxError::UserCancelled);
            }
        };

        match flow.submit_password(&password) {
            Ok(()) => return Ok(()),
            Err(LockboxError::EmptyPassword) => {
                output::warning("Password cannot be empty.");
            }
            Err(LockboxError::WrongPassword { remaining }) => {
                output::warning(&format!(
                    "Wrong password. {remaining} attempt(s) left before the vault is wiped."
                ));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Run the setup branch of the unlock flow for a new vault.
pub fn set_master_password(vault: &Vault) -> Result<()> {
    let mut flow = vault.unlock_flow();
    if flow.start()? != UnlockState::AwaitingFirstPassword {
        flow.cancel();
        output::tip("Run `lockbox list` to use the existing vault.");
        return Err(LockboxError::VaultAlreadyInitialized);
    }

    if let Some(password) = password_from_env() {
        return flow.submit_new_password(&password, &password);
    }

    let min = flow.policy().min_password_len;
    loop {
        let entered = prompt("Choose master password")
            .and_then(|pw| Ok((pw, prompt("Confirm master password")?)));
        let (password, confirmation) = match entered {
            Ok(pair) => pair,
            Err(_) => {
                flow.cancel();
                return Err(LockboxError::UserCancelled);
            }
        };

        match flow.submit_new_password(&password, &confirmation) {
            Ok(()) => return Ok(()),
            Err(LockboxError::PasswordTooShort { .. }) => {
                output::warning(&format!(
                    "Password must be at least {min} characters. Try again."
                ));
            }
            Err(LockboxError::PasswordMismatch) => {
                output::warning("Passwords do not match, try again.");
            }
            Err(e) => return Err(e),
        }
    }
}

/// `LOCKBOX_PASSWORD`, if set and non-empty.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Hidden-input prompt.  Empty input is allowed; the caller decides.
pub fn prompt(label: &str) -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt(label)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Ask for a yes/no confirmation, defaulting to no.
pub fn confirm(question: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| LockboxError::ClipboardError(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| LockboxError::ClipboardError(e.to_string()))
}
