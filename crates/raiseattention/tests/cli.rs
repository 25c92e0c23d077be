//! End-to-end tests driving the built binary directly. No
//! `assert_cmd`/`predicates` here -- neither is part of the workspace's
//! dependency set -- so these assert against `std::process::Output` by
//! hand.

use std::process::{Command, Output};

use assert_fs::prelude::*;
use assert_fs::TempDir;

fn raiseattention() -> Command {
    Command::new(env!("CARGO_BIN_EXE_raiseattention"))
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    raiseattention()
        .current_dir(dir.path())
        .args(args)
        .output()
        .expect("failed to run raiseattention binary")
}

#[test]
fn clean_project_exits_zero_with_no_issues() {
    let dir = TempDir::new().unwrap();
    dir.child("a.py").write_str("def f():\n    pass\n").unwrap();

    let output = run(&dir, &["check", "."]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 issue(s) found"));
}

#[test]
fn unhandled_exception_exits_one_and_reports_the_call_site() {
    let dir = TempDir::new().unwrap();
    dir.child("a.py")
        .write_str("def r():\n    raise ValueError(\"boom\")\n\ndef c():\n    r()\n")
        .unwrap();

    let output = run(&dir, &["check", "."]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ValueError"));
    assert!(stdout.contains("1 issue(s) found"));
}

#[test]
fn json_output_is_well_formed_and_carries_file_counts() {
    let dir = TempDir::new().unwrap();
    dir.child("a.py")
        .write_str("def r():\n    raise KeyError()\n\ndef c():\n    r()\n")
        .unwrap();

    let output = run(&dir, &["check", "--json", "."]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("stdout must be valid JSON");
    assert_eq!(value["files_analyzed"], 1);
    assert_eq!(value["diagnostics"].as_array().unwrap().len(), 1);
}

#[test]
fn ignore_comment_suppresses_the_named_exception() {
    let dir = TempDir::new().unwrap();
    dir.child("a.py")
        .write_str("def r():\n    raise ValueError(\"x\")\n\ndef c():\n    r()  # ra: ignore[ValueError]\n")
        .unwrap();

    let output = run(&dir, &["check", "."]);

    assert!(output.status.success());
}

#[test]
fn syntax_error_is_reported_without_crashing_the_run() {
    let dir = TempDir::new().unwrap();
    dir.child("bad.py").write_str("def (:\n").unwrap();

    let output = run(&dir, &["check", "."]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("internal error"));
}

#[test]
fn cache_status_reports_a_fresh_empty_cache() {
    let dir = TempDir::new().unwrap();

    let output = run(&dir, &["cache", "status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("file entries: 0"));
}

#[test]
fn no_cache_flag_still_produces_correct_diagnostics() {
    let dir = TempDir::new().unwrap();
    dir.child("a.py")
        .write_str("def r():\n    raise ValueError(\"x\")\n\ndef c():\n    r()\n")
        .unwrap();

    let output = run(&dir, &["check", "--no-cache", "."]);

    assert_eq!(output.status.code(), Some(1));
}
