//! `lockbox edit` — change fields of an existing password entry.
//!
//! Only the fields passed on the command line change; everything else is
//! carried over from the stored entry.

use crate::cli::output;
use crate::cli::{unlock, Cli, EntryFields};
use crate::errors::{LockboxError, Result};
use crate::vault::PasswordInput;

use super::add::{entry_password, parse_expiry};

/// Field changes requested on the command line.
pub struct EditArgs<'a> {
    pub title: Option<&'a str>,
    pub fields: &'a EntryFields,
    pub unfavorite: bool,
    pub no_expiry: bool,
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: i64, args: &EditArgs<'_>) -> Result<()> {
    let vault = unlock(cli)?;
    let passwords = vault.passwords();

    let (entry, readable) = passwords.get_lenient(id)?;
    if needs_new_password(readable, args.fields) {
        output::tip("The stored password cannot be decrypted; pass --password or --generate.");
        return Err(LockboxError::CorruptToken);
    }

    let mut input = entry.to_input();
    if !apply(&mut input, args)? {
        output::info("No changes requested.");
        output::tip("Pass e.g. --username, --password or --generate to change a field.");
        return Ok(());
    }

    passwords.update(id, &input)?;
    output::success(&format!("Updated entry {id} '{}'", input.title.trim()));

    Ok(())
}

/// An unreadable password may only be replaced, never carried over.
fn needs_new_password(readable: bool, fields: &EntryFields) -> bool {
    !readable && fields.password.is_none() && !fields.generate
}

/// Apply the requested changes; returns whether anything was requested.
fn apply(input: &mut PasswordInput, args: &EditArgs<'_>) -> Result<bool> {
    let fields = args.fields;
    let mut changed = false;

    let mut set = |slot: &mut String, value: Option<&String>| {
        if let Some(v) = value {
            *slot = v.clone();
            changed = true;
        }
    };
    set(&mut input.title, args.title.map(str::to_string).as_ref());
    set(&mut input.username, fields.username.as_ref());
    set(&mut input.url, fields.url.as_ref());
    set(&mut input.category, fields.category.as_ref());
    set(&mut input.notes, fields.notes.as_ref());

    if let Some(pw) = entry_password(fields)? {
        input.password = pw.to_string();
        changed = true;
    }
    if let Some(expires) = fields.expires.as_deref() {
        input.expires_at = Some(parse_expiry(expires)?);
        changed = true;
    }
    if args.no_expiry {
        input.expires_at = None;
        changed = true;
    }
    if fields.favorite || args.unfavorite {
        input.is_favorite = fields.favorite;
        changed = true;
    }

    Ok(changed)
}
