//! Integration tests for the Lockbox CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Interactive prompts are avoided by passing the master password through
//! `LOCKBOX_PASSWORD` and entry passwords through `--password`.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use lockbox::store::{SqliteStore, Store, Value};
use predicates::prelude::*;

const MASTER: &str = "correct-pw";

/// Helper: get a Command pointing at the lockbox binary.
fn lockbox() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("lockbox").expect("binary should exist")
}

/// Helper: a project dir with a fast KDF config.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".lockbox.toml")
        .write_str("pbkdf2_iterations = 10000\n")
        .unwrap();
    tmp
}

/// Helper: run lockbox in `dir` with the master password set.
fn run(dir: &TempDir, password: &str, args: &[&str]) -> assert_cmd::assert::Assert {
    lockbox()
        .args(args)
        .current_dir(dir.path())
        .env("LOCKBOX_PASSWORD", password)
        .assert()
}

fn initialized() -> TempDir {
    let tmp = project();
    run(&tmp, MASTER, &["init"]).success();
    tmp
}

#[test]
fn help_flag_shows_usage() {
    lockbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Local encrypted password and date-record vault",
        ))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("dates"));
}

#[test]
fn version_flag_shows_version() {
    lockbox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lockbox"));
}

#[test]
fn no_args_shows_help() {
    lockbox()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn list_on_missing_vault_fails() {
    let tmp = project();
    run(&tmp, MASTER, &["list"])
        .failure()
        .stderr(predicate::str::contains("No vault found"));
    tmp.child("lockbox.db").assert(predicate::path::missing());
}

#[test]
fn init_creates_database() {
    let tmp = initialized();
    tmp.child("lockbox.db").assert(predicate::path::exists());
}

#[test]
fn init_rejects_short_password() {
    let tmp = project();
    run(&tmp, "short", &["init"])
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
}

#[test]
fn init_twice_fails() {
    let tmp = initialized();
    run(&tmp, MASTER, &["init"])
        .failure()
        .stderr(predicate::str::contains("already set"));
}

#[test]
fn add_then_get_and_list() {
    let tmp = initialized();
    run(
        &tmp,
        MASTER,
        &["add", "bank", "-u", "alice", "-p", "hunter2", "-c", "Bank Accounts"],
    )
    .success()
    .stdout(predicate::str::contains("entry 1"));

    run(&tmp, MASTER, &["get", "1"])
        .success()
        .stdout(predicate::str::contains("hunter2"))
        .stdout(predicate::str::contains("alice"));

    run(&tmp, MASTER, &["list"])
        .success()
        .stdout(predicate::str::contains("bank"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn edit_changes_only_given_fields() {
    let tmp = initialized();
    run(&tmp, MASTER, &["add", "mail", "-u", "alice", "-p", "first"]).success();
    run(&tmp, MASTER, &["edit", "1", "-p", "second"]).success();

    run(&tmp, MASTER, &["get", "1"])
        .success()
        .stdout(predicate::str::contains("second"))
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn delete_with_force_removes_entry() {
    let tmp = initialized();
    run(&tmp, MASTER, &["add", "mail", "-p", "pw"]).success();
    run(&tmp, MASTER, &["delete", "1", "--force"]).success();
    run(&tmp, MASTER, &["get", "1"])
        .failure()
        .stderr(predicate::str::contains("Record 1 not found"));
}

/// Helper: overwrite the stored password of entry `id` with garbage.
fn corrupt_entry(dir: &TempDir, id: i64) {
    let db = SqliteStore::open(&dir.path().join("lockbox.db")).unwrap();
    db.execute(
        "UPDATE passwords SET encrypted_password = 'not a token' WHERE id = ?1",
        &[Value::from(id)],
    )
    .unwrap();
}

#[test]
fn unreadable_entry_can_be_deleted() {
    let tmp = initialized();
    run(&tmp, MASTER, &["add", "mail", "-p", "pw"]).success();
    corrupt_entry(&tmp, 1);

    run(&tmp, MASTER, &["get", "1"])
        .failure()
        .stderr(predicate::str::contains("corrupt"));
    run(&tmp, MASTER, &["delete", "1", "--force"])
        .success()
        .stdout(predicate::str::contains("Deleted entry 1 'mail'"));
    run(&tmp, MASTER, &["list"])
        .success()
        .stdout(predicate::str::contains("No password entries found"));
}

#[test]
fn unreadable_entry_can_be_given_a_new_password() {
    let tmp = initialized();
    run(&tmp, MASTER, &["add", "mail", "-u", "alice", "-p", "pw"]).success();
    corrupt_entry(&tmp, 1);

    // Keeping the unreadable password is refused.
    run(&tmp, MASTER, &["edit", "1", "-u", "bob"])
        .failure()
        .stderr(predicate::str::contains("corrupt"));

    run(&tmp, MASTER, &["edit", "1", "-p", "replacement"]).success();
    run(&tmp, MASTER, &["get", "1"])
        .success()
        .stdout(predicate::str::contains("replacement"))
        .stdout(predicate::str::contains("alice"));
}

#[test]
fn wrong_password_is_rejected() {
    let tmp = initialized();
    run(&tmp, MASTER, &["add", "mail", "-p", "pw"]).success();

    run(&tmp, "not-the-password", &["list"])
        .failure()
        .stderr(predicate::str::contains("Wrong master password"));

    // One attempt per process: the entry survives.
    run(&tmp, MASTER, &["get", "1"]).success();
}

#[test]
fn categories_are_seeded_and_extendable() {
    let tmp = initialized();
    run(&tmp, MASTER, &["categories"])
        .success()
        .stdout(predicate::str::contains("Social Media"));
    run(&tmp, MASTER, &["categories", "--add", "Work"]).success();
    run(&tmp, MASTER, &["categories"])
        .success()
        .stdout(predicate::str::contains("Work"));
}

#[test]
fn dates_are_listed_newest_first() {
    let tmp = initialized();
    run(&tmp, MASTER, &["dates", "add", "older", "2020-01-01"]).success();
    run(&tmp, MASTER, &["dates", "add", "newer", "2024-01-01"]).success();

    let out = run(&tmp, MASTER, &["dates", "list"]).success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let newer = stdout.find("newer").unwrap();
    let older = stdout.find("older").unwrap();
    assert!(newer < older);

    run(&tmp, MASTER, &["dates", "clear", "--force"])
        .success()
        .stdout(predicate::str::contains("Deleted 2"));
}

#[test]
fn db_flag_overrides_config() {
    let tmp = project();
    run(&tmp, MASTER, &["--db", "other.db", "init"]).success();
    tmp.child("other.db").assert(predicate::path::exists());
    tmp.child("lockbox.db").assert(predicate::path::missing());
}

#[test]
fn generate_needs_no_vault() {
    let tmp = TempDir::new().unwrap();
    let out = lockbox()
        .args(["generate", "--length", "24", "--no-symbols"])
        .current_dir(tmp.path())
        .assert()
        .success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let pw = stdout.trim();
    assert_eq!(pw.chars().count(), 24);
    assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
}
