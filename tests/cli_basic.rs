//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, and each subcommand
//! responds to `--help` with appropriate text.

#![allow(deprecated)] // cargo_bin is deprecated upstream; the replacement is not stable yet

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `vscompare` binary.
fn vscompare() -> Command {
    Command::cargo_bin("vscompare").expect("binary 'vscompare' should be built")
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    vscompare()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: vscompare"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("timeline"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn version_flag_shows_semver() {
    vscompare()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^vscompare \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    vscompare()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: vscompare"));
}

#[test]
fn invalid_subcommand_fails() {
    vscompare()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn compare_help() {
    vscompare()
        .args(["compare", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--window"))
        .stdout(predicate::str::contains("--sweep"));
}

#[test]
fn timeline_help() {
    vscompare()
        .args(["timeline", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--width"))
        .stdout(predicate::str::contains("--duration"));
}

#[test]
fn simulate_help() {
    vscompare()
        .args(["simulate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--rate"))
        .stdout(predicate::str::contains("--layout"));
}

#[test]
fn summarize_help() {
    vscompare()
        .args(["summarize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--model"))
        .stdout(predicate::str::contains("--chunk-duration"));
}

// ─── Argument validation ─────────────────────────────────────────────────────

#[test]
fn format_rejects_unknown_value() {
    vscompare()
        .args(["compare", "1=a.json", "2=b.json", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn simulate_rejects_unsupported_rate() {
    let dir = tempfile::tempdir().unwrap();
    vscompare()
        .args(["simulate", "--rate", "3"])
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported playback rate"));
}

#[test]
fn health_reports_unreachable_backend() {
    let dir = tempfile::tempdir().unwrap();
    vscompare()
        .args(["health", "--backend", "http://127.0.0.1:9/api"])
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .env_remove("VSCOMPARE_BACKEND_URL")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not healthy"));
}
