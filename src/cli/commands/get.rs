//! `lockbox get` — show one password entry.

use crate::cli::output;
use crate::cli::{copy_to_clipboard, unlock, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, id: i64, copy: bool) -> Result<()> {
    let vault = unlock(cli)?;
    let entry = vault.passwords().get(id)?;

    if copy {
        copy_to_clipboard(&entry.password)?;
    }
    output::print_entry(&entry, copy);
    if copy {
        output::success("Password copied to clipboard.");
    }

    Ok(())
}
