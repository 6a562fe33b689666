//! Binary integration tests for the tabella CLI
//!
//! These run the built binary as a subprocess to cover argument parsing,
//! option loading and exit codes.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tabella() -> Command {
    Command::cargo_bin("tabella").unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_help_lists_commands() {
    tabella()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("template"));
}

#[test]
fn test_version() {
    tabella()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_import_requires_mapping() {
    tabella()
        .args(["import", "prices.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--mapping"));
}

#[test]
fn test_unknown_command_fails() {
    tabella().arg("calculate").assert().failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// COMMANDS END TO END
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("prices.xlsx");
    let report = dir.path().join("report.json");

    tabella()
        .arg("export")
        .arg(&workbook)
        .args(["--mapping", "test-data/prices.yaml"])
        .args(["--data", "test-data/prices.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Export Complete"));

    tabella()
        .arg("import")
        .arg(&workbook)
        .args(["--mapping", "test-data/prices.yaml", "--check-duplicates"])
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Duplicate rows detected"))
        .stdout(predicate::str::contains("sheet_processing_message_duplicate"));

    let content = std::fs::read_to_string(&report).unwrap();
    assert!(content.contains("\"A-2\""));
}

#[test]
fn test_template_writes_workbook() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("blank.xlsx");

    tabella()
        .arg("template")
        .arg(&workbook)
        .args(["-m", "test-data/prices.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prices"));

    assert!(workbook.exists());
}

#[test]
fn test_config_from_environment() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("prices.xlsx");
    let report = dir.path().join("report.json");

    tabella()
        .arg("export")
        .arg(&workbook)
        .args(["-m", "test-data/prices.yaml", "-d", "test-data/prices.json"])
        .assert()
        .success();

    tabella()
        .env("TABELLA_CONFIG", "test-data/options.yaml")
        .arg("import")
        .arg(&workbook)
        .args(["-m", "test-data/prices.yaml", "--check-duplicates"])
        .arg("-o")
        .arg(&report)
        .assert()
        .success();

    let content = std::fs::read_to_string(&report).unwrap();
    assert!(content.contains("\"PriceImport\""));
}

#[test]
fn test_bad_config_fails_with_context() {
    tabella()
        .args(["--config", "test-data/missing.yaml", "template", "out.xlsx"])
        .args(["-m", "test-data/prices.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load options"));
}

#[test]
fn test_failed_export_exits_nonzero() {
    let dir = TempDir::new().unwrap();

    tabella()
        .arg("export")
        .arg(dir.path().join("prices.xlsx"))
        .args(["-m", "test-data/prices.yaml", "-d", "test-data/bad_prices.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("amount"));
}
