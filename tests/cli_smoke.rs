use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn ghpulse(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("ghpulse").unwrap();
    // Never pick up a real user config or token.
    cmd.arg("--config")
        .arg(config_dir.join("config.toml"))
        .env_remove("GHPULSE_USERNAME")
        .env_remove("GHPULSE_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_window_flags() {
    let dir = tempdir().unwrap();
    ghpulse(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--start-date"))
        .stdout(predicate::str::contains("--end-date"))
        .stdout(predicate::str::contains("--branch"));
}

#[test]
fn url_is_required() {
    let dir = tempdir().unwrap();
    ghpulse(dir.path()).assert().failure();
}

#[test]
fn rejects_url_without_repository() {
    let dir = tempdir().unwrap();
    ghpulse(dir.path())
        .args(["--url", "https://github.com/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse repository URL"));
}

#[test]
fn rejects_inverted_window() {
    let dir = tempdir().unwrap();
    ghpulse(dir.path())
        .args(["--url", "https://github.com/octo/widgets"])
        .args(["-s", "2024-02-01", "-e", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve date window"));
}

#[test]
fn rejects_date_not_matching_format() {
    let dir = tempdir().unwrap();
    ghpulse(dir.path())
        .args(["--url", "https://github.com/octo/widgets"])
        .args(["-s", "2024-02-01", "-f", "%d.%m.%Y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match format"));
}

#[test]
fn broken_config_file_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[api\n").unwrap();
    ghpulse(dir.path())
        .args(["--url", "https://github.com/octo/widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn json_and_ndjson_conflict() {
    let dir = tempdir().unwrap();
    ghpulse(dir.path())
        .args(["--url", "https://github.com/octo/widgets", "--json", "--ndjson"])
        .assert()
        .failure();
}

#[test]
fn log_file_receives_config_warning() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("ghpulse.log");
    ghpulse(dir.path())
        .args(["--url", "https://github.com/"])
        .arg("--log-file")
        .arg(&log)
        .assert()
        .failure();

    let written = fs::read_to_string(&log).unwrap();
    assert!(written.contains("configuration unavailable"));
}
