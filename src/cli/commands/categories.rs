//! `lockbox categories` — list categories or add a new one.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;

/// Execute the `categories` command.
pub fn execute(cli: &Cli, add: Option<&str>) -> Result<()> {
    let vault = unlock(cli)?;
    let passwords = vault.passwords();

    if let Some(name) = add {
        if passwords.add_category(name)? {
            output::success(&format!("Added category '{}'", name.trim()));
        } else {
            output::info(&format!("Category '{}' already exists.", name.trim()));
        }
        return Ok(());
    }

    for name in passwords.categories()? {
        println!("{name}");
    }
    Ok(())
}
