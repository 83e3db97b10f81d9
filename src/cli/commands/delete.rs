//! `lockbox delete` — remove a password entry.

use crate::cli::output;
use crate::cli::{confirm, unlock, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    let vault = unlock(cli)?;
    let passwords = vault.passwords();

    // Only the plain title is needed, so entries that no longer decrypt
    // can still be removed.
    let title = passwords.title(id)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete entry {id} '{title}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    passwords.delete(id)?;
    output::success(&format!("Deleted entry {id} '{title}'"));

    Ok(())
}
