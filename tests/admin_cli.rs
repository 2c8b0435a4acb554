//! Smoke tests for the administrative CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mailseal() -> Command {
    Command::cargo_bin("mailseal").unwrap()
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Write a config pointing the identity store into the temp dir.
fn write_config(dir: &TempDir) -> String {
    let config_path = dir.path().join("mailseal.toml");
    let store_path = dir.path().join("identities");
    std::fs::write(
        &config_path,
        format!("[store]\npath = \"{}\"\n", store_path.display()),
    )
    .unwrap();
    config_path.to_str().unwrap().to_string()
}

#[test]
fn add_then_list_shows_address_and_fingerprint() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let cert = fixture("recipient1.crt");
    let key = fixture("recipient1.key");

    mailseal()
        .args([
            "--config",
            config.as_str(),
            "identity",
            "add",
            "--cert",
            cert.as_str(),
            "--key",
            key.as_str(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("ok:"));

    mailseal()
        .args(["--config", config.as_str(), "identity", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recipient1@example.com"))
        .stdout(predicate::str::contains(
            "FE:B0:4E:F7:85:D0:C0:31:84:F6:AD:CD:3B:C4:9F:5D:AE:C8:EC:0A",
        ))
        .stdout(predicate::str::contains("(signing)"));
}

#[test]
fn list_with_empty_store() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    mailseal()
        .args(["--config", config.as_str(), "identity", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no identities stored"));
}

#[test]
fn add_certificate_without_email_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let cert = fixture("noemail.crt");

    mailseal()
        .args([
            "--config",
            config.as_str(),
            "identity",
            "add",
            "--cert",
            cert.as_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("email address"));
}

#[test]
fn add_with_invalid_explicit_address_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let cert = fixture("recipient1.crt");

    mailseal()
        .args([
            "--config",
            config.as_str(),
            "identity",
            "add",
            "--cert",
            cert.as_str(),
            "--address",
            "not-an-address",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "does not look like an email address",
        ));
}

#[test]
fn remove_reports_the_count() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let cert = fixture("recipient2.crt");

    mailseal()
        .args([
            "--config",
            config.as_str(),
            "identity",
            "add",
            "--cert",
            cert.as_str(),
        ])
        .assert()
        .success();

    mailseal()
        .args([
            "--config",
            config.as_str(),
            "identity",
            "remove",
            "recipient2@example.com",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("removed 1"));

    mailseal()
        .args([
            "--config",
            config.as_str(),
            "identity",
            "show",
            "recipient2@example.com",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no identities stored"));
}
