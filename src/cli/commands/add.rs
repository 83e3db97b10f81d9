//! `lockbox add` — store a new password entry.

use chrono::NaiveDate;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{prompt, unlock, Cli, EntryFields};
use crate::crypto::generator::{self, GeneratorOptions};
use crate::errors::{LockboxError, Result};
use crate::vault::{PasswordInput, DATE_FORMAT};

/// Execute the `add` command.
pub fn execute(cli: &Cli, title: &str, fields: &EntryFields) -> Result<()> {
    let vault = unlock(cli)?;

    let password = match entry_password(fields)? {
        Some(pw) => pw,
        None => prompt("Password for this entry")?,
    };

    let input = PasswordInput {
        title: title.to_string(),
        username: fields.username.clone().unwrap_or_default(),
        password: password.to_string(),
        url: fields.url.clone().unwrap_or_default(),
        category: fields.category.clone().unwrap_or_default(),
        notes: fields.notes.clone().unwrap_or_default(),
        expires_at: fields.expires.as_deref().map(parse_expiry).transpose()?,
        is_favorite: fields.favorite,
    };

    let id = vault.passwords().add(&input)?;
    output::success(&format!("Added '{}' as entry {id}", input.title.trim()));
    if fields.generate {
        output::tip(&format!("Run `lockbox get {id}` to see the generated password."));
    }

    Ok(())
}

/// The password given on the command line or generated, if either was
/// asked for.
pub(crate) fn entry_password(fields: &EntryFields) -> Result<Option<Zeroizing<String>>> {
    if fields.generate {
        return Ok(Some(generator::generate(&GeneratorOptions::default())));
    }
    Ok(fields.password.clone().map(Zeroizing::new))
}

/// Parse a `YYYY-MM-DD` expiry date.
pub(crate) fn parse_expiry(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
        LockboxError::InvalidRecord(format!("expiry date '{s}' is not in YYYY-MM-DD format"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_expiry_dates() {
        assert_eq!(
            parse_expiry("2025-03-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
        );
        assert!(parse_expiry("31/03/2025").is_err());
    }

    #[test]
    fn generate_flag_produces_a_password() {
        let fields = EntryFields {
            generate: true,
            ..EntryFields::default()
        };
        let pw = entry_password(&fields).unwrap().unwrap();
        assert_eq!(pw.chars().count(), 16);
    }
}
