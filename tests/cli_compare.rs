//! Integration tests for the comparison commands: `compare`, `timeline` and
//! `simulate`, driven with event files in a temp directory.

#![allow(deprecated)] // cargo_bin is deprecated upstream; the replacement is not stable yet

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vscompare(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vscompare").expect("binary 'vscompare' should be built");
    // Keep the user's config out of the way
    cmd.arg("--config").arg(dir.join("absent.toml"));
    cmd
}

fn write_events(dir: &TempDir, name: &str, json: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json).unwrap();
    path
}

/// Two streams: a simultaneous motion pair and vehicles 10 s apart
fn fixtures() -> (TempDir, String, String) {
    let dir = tempfile::tempdir().unwrap();
    let a = write_events(
        &dir,
        "a.json",
        r#"[
            {"id":"a1","timestamp":5.0,"type":"motion","description":"Door opens","confidence":0.9},
            {"id":"a2","timestamp":30.0,"type":"vehicle","description":"Truck","confidence":0.8}
        ]"#,
    );
    let b = write_events(
        &dir,
        "b.json",
        r#"[
            {"id":"b1","timestamp":5.5,"type":"motion","description":"Gate moves","confidence":0.7},
            {"id":"b2","timestamp":40.0,"type":"vehicle","description":"Van","confidence":0.6},
            {"id":"broken","timestamp":-3.0,"type":"motion","description":"","confidence":0.1}
        ]"#,
    );
    let a = format!("1={}", a.display());
    let b = format!("2={}", b.display());
    (dir, a, b)
}

#[test]
fn compare_requires_two_streams() {
    let (dir, a, _b) = fixtures();
    vscompare(dir.path())
        .args(["compare", &a])
        .assert()
        .failure()
        .stderr(predicate::str::contains("select at least 2 videos to compare"));
}

#[test]
fn compare_prints_text_report() {
    let (dir, a, b) = fixtures();
    vscompare(dir.path())
        .args(["compare", &a, &b, "--at", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("> [Simultaneous] 00:05  motion"))
        .stdout(predicate::str::contains("motion detected in multiple streams"))
        .stdout(predicate::str::contains("Total Events: 1   Simultaneous: 1"))
        .stdout(predicate::str::contains("vehicle").not());
}

#[test]
fn compare_json_report() {
    let (dir, a, b) = fixtures();
    let output = vscompare(dir.path())
        .args(["compare", &a, &b, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total"], 1);
    assert_eq!(report["entries"][0]["id"], "corr-1-a1-2-b1");
    assert_eq!(report["entries"][0]["timestamp"], 5.25);
    assert_eq!(report["entries"][0]["streams"], serde_json::json!([1, 2]));
}

#[test]
fn wider_window_admits_vehicle_pair() {
    let (dir, a, b) = fixtures();
    vscompare(dir.path())
        .args(["compare", &a, &b, "--window", "10", "--sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Related] 00:35  vehicle"))
        .stdout(predicate::str::contains("Time difference: 10.0s"))
        .stdout(predicate::str::contains("Total Events: 2"));
}

#[test]
fn compare_saves_markdown() {
    let (dir, a, b) = fixtures();
    let out = dir.path().join("report.md");
    vscompare(dir.path())
        .args(["compare", &a, &b, "--format", "markdown", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved report"));

    let md = std::fs::read_to_string(&out).unwrap();
    assert!(md.starts_with("# Cross-Stream Events"));
    assert!(md.contains("| 00:05 | Simultaneous | motion | 1, 2 | 0.5s |"));
}

#[test]
fn timeline_renders_bar_and_overlays() {
    let (dir, a, b) = fixtures();
    vscompare(dir.path())
        .args(["timeline", &a, &b])
        .args(["--duration", "60", "--at", "6", "--width", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Timeline  1 cross-stream events  [00:06 / 01:00]"))
        .stdout(predicate::str::contains("#"))
        .stdout(predicate::str::contains("Stream 1: motion 90%"))
        .stdout(predicate::str::contains("Stream 2: motion 70%"));
}

#[test]
fn simulate_mock_streams() {
    let dir = tempfile::tempdir().unwrap();
    vscompare(dir.path())
        .args(["simulate", "--seconds", "6", "--rate", "2"])
        .args(["--duration", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:02"))
        .stdout(predicate::str::contains("Stopped at 00:12 of 01:00"));
}

#[test]
fn simulate_stops_at_end_of_media() {
    let dir = tempfile::tempdir().unwrap();
    vscompare(dir.path())
        .args(["simulate", "--count", "2", "--duration", "10"])
        .args(["--seconds", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped at 00:10 of 00:10 after 10.0s"));
}
