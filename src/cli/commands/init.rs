//! `lockbox init` — create a new vault and set its master password.

use crate::cli::output;
use crate::cli::{set_master_password, Cli, Vault};
use crate::errors::Result;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    // 1. Open (or create) the database and its record tables.
    let vault = Vault::create(cli)?;

    // 2. Run the setup branch of the unlock flow.
    set_master_password(&vault)?;

    output::success(&format!("Vault created at {}", vault.path.display()));

    // 3. Show helpful tips.
    output::tip("Run `lockbox add <TITLE>` to store a password.");
    output::tip("Run `lockbox dates add <TITLE> <DATE>` to store a date.");
    output::tip("Run `lockbox list` to see your entries.");

    Ok(())
}
