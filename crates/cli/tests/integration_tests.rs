//! Integration tests for coachctl's exit-code contract (spec §6).

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn coachctl() -> Command {
    Command::cargo_bin("coachctl").expect("coachctl binary is built by this workspace")
}

#[test]
fn malformed_capture_exits_with_code_2() {
    let dir = TempDir::new().unwrap();
    let capture_path = dir.path().join("bad.cap");
    fs::write(&capture_path, b"not a capture file").unwrap();
    let store_path = dir.path().join("tracks.sqlite3");

    coachctl()
        .arg(&capture_path)
        .arg("--track-store")
        .arg(&store_path)
        .assert()
        .code(2);
}

#[test]
fn missing_capture_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("tracks.sqlite3");

    coachctl()
        .arg(dir.path().join("does_not_exist.cap"))
        .arg("--track-store")
        .arg(&store_path)
        .assert()
        .code(2);
}
