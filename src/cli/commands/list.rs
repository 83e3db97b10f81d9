//! `lockbox list` — display password entries in a table.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;
use crate::vault::PasswordFilter;

/// Execute the `list` command.
pub fn execute(cli: &Cli, category: Option<&str>, search: Option<&str>) -> Result<()> {
    let vault = unlock(cli)?;

    let filter = PasswordFilter {
        category: category.map(str::to_string),
        search: search.map(str::to_string),
    };
    let listing = vault.passwords().list(&filter)?;

    output::info(&format!("{} entr(y/ies)", listing.len()));
    output::print_entries_table(&listing.entries);
    output::report_failures(&listing);

    Ok(())
}
