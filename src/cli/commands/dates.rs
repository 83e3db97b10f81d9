//! `lockbox dates` — add, list, delete and clear date records.

use crate::cli::output;
use crate::cli::{confirm, unlock, Cli, DatesAction};
use crate::errors::Result;

/// Execute a `dates` subcommand.
pub fn execute(cli: &Cli, action: &DatesAction) -> Result<()> {
    let vault = unlock(cli)?;
    let dates = vault.dates();

    match action {
        DatesAction::Add { title, date } => {
            let id = dates.add(title, date)?;
            output::success(&format!("Added date record {id}"));
        }
        DatesAction::List => {
            let listing = dates.list()?;
            output::info(&format!("{} date record(s)", listing.len()));
            output::print_dates_table(&listing.entries);
            output::report_failures(&listing);
        }
        DatesAction::Delete { id, force } => {
            if !force && !confirm(&format!("Delete date record {id}?"))? {
                output::info("Cancelled.");
                return Ok(());
            }
            dates.delete(*id)?;
            output::success(&format!("Deleted date record {id}"));
        }
        DatesAction::Clear { force } => {
            if !force && !confirm("Delete ALL date records?")? {
                output::info("Cancelled.");
                return Ok(());
            }
            let removed = dates.clear()?;
            output::success(&format!("Deleted {removed} date record(s)"));
        }
    }

    Ok(())
}
