//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{Local, NaiveDate, NaiveDateTime};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{DateRecord, Listing, PasswordEntry};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Warn once per listing about rows that could not be decrypted.
pub fn report_failures<T>(listing: &Listing<T>) {
    if listing.is_clean() {
        return;
    }
    let ids: Vec<String> = listing.failures.iter().map(|f| f.id.to_string()).collect();
    warning(&format!(
        "{} record(s) could not be decrypted: {}",
        listing.failures.len(),
        ids.join(", ")
    ));
}

/// Print a table of password entries.  Passwords are never shown here.
pub fn print_entries_table(entries: &[PasswordEntry]) {
    if entries.is_empty() {
        info("No password entries found.");
        tip("Run `lockbox add <TITLE>` to add your first entry.");
        return;
    }

    let today = today();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "", "Title", "Username", "Category", "Expires", "Updated"]);

    for e in entries {
        let expires = match e.expires_at {
            Some(d) if e.is_expired(today) => format!("{d} (expired)"),
            Some(d) => d.to_string(),
            None => String::new(),
        };
        table.add_row(vec![
            e.id.to_string(),
            if e.is_favorite { "\u{2605}".to_string() } else { String::new() },
            e.title.clone(),
            e.username.clone(),
            e.category.clone(),
            expires,
            timestamp(e.updated_at),
        ]);
    }

    println!("{table}");
}

/// Print every field of one entry; the password is masked when `hide_password`.
pub fn print_entry(entry: &PasswordEntry, hide_password: bool) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let password = if hide_password {
        "(copied to clipboard)".to_string()
    } else {
        entry.password.clone()
    };
    let expires = match entry.expires_at {
        Some(d) if entry.is_expired(today()) => format!("{d} (expired)"),
        Some(d) => d.to_string(),
        None => String::new(),
    };

    let rows = [
        ("Title", entry.title.clone()),
        ("Username", entry.username.clone()),
        ("Password", password),
        ("URL", entry.url.clone()),
        ("Category", entry.category.clone()),
        ("Notes", entry.notes.clone()),
        ("Expires", expires),
        ("Favorite", if entry.is_favorite { "yes" } else { "no" }.to_string()),
        ("Created", timestamp(entry.created_at)),
        ("Updated", timestamp(entry.updated_at)),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }

    println!("{table}");
}

/// Print a table of date records.
pub fn print_dates_table(records: &[DateRecord]) {
    if records.is_empty() {
        info("No date records yet.");
        tip("Run `lockbox dates add <TITLE> <DATE>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Date", "Title", "Added"]);

    for r in records {
        table.add_row(vec![
            r.id.to_string(),
            r.date.clone(),
            r.title.clone(),
            timestamp(r.created_at),
        ]);
    }

    println!("{table}");
}
