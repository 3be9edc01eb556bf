use ghpulse::config::{ENV_TOKEN, ENV_USERNAME};
use ghpulse::{AuthCredential, EngineConfig, FileConfig};
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn full_config_file() {
    let config = FileConfig::parse(
        r#"
        [auth]
        username = "octocat"
        token = "secret"

        [api]
        base_url = "https://github.example.com/api/v3/"
        timeout = "10s"

        [report]
        top_users = 10
        stale_pull_days = 21
        stale_issue_days = 7
        "#,
    )
    .unwrap();

    let engine = config.engine_config().unwrap();
    assert_eq!(engine.base_url, "https://github.example.com/api/v3");
    assert_eq!(engine.timeout, Duration::from_secs(10));
    assert_eq!(engine.top_users, 10);
    assert_eq!(engine.stale_pull_days, 21);
    assert_eq!(engine.stale_issue_days, 7);
    assert_eq!(engine.per_page, 100);

    let credential = config.credential().unwrap();
    assert_eq!(credential.encoded(), "b2N0b2NhdDpzZWNyZXQ=");
    assert_eq!(credential.header_value(), "Basic b2N0b2NhdDpzZWNyZXQ=");
}

#[test]
fn empty_file_means_defaults() {
    let config = FileConfig::parse("").unwrap();
    assert!(config.credential().is_none());
    assert_eq!(config.engine_config().unwrap(), EngineConfig::default());
}

#[test]
fn missing_file_is_not_fatal() {
    let dir = tempdir().unwrap();
    let config = FileConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert!(config.credential().is_none());
}

#[test]
fn broken_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[auth\nusername = ").unwrap();
    assert!(FileConfig::load(Some(&path)).is_err());
}

#[test]
fn loads_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[report]\nstale_issue_days = 3\n").unwrap();

    let engine = FileConfig::load(Some(&path)).unwrap().engine_config().unwrap();
    assert_eq!(engine.stale_issue_days, 3);
    assert_eq!(engine.stale_pull_days, 30);
}

#[test]
fn environment_overrides_file() {
    let config = FileConfig::parse("[auth]\nusername = \"file-user\"\ntoken = \"file-token\"\n")
        .unwrap()
        .with_overrides(|key| match key {
            k if k == ENV_TOKEN => Some("env-token".to_string()),
            k if k == ENV_USERNAME => Some(String::new()),
            _ => None,
        });

    assert_eq!(
        config.credential(),
        Some(AuthCredential::basic("file-user", "env-token"))
    );
}

#[test]
fn half_a_credential_is_ignored() {
    let config = FileConfig::parse("[auth]\ntoken = \"lonely\"\n").unwrap();
    assert!(config.credential().is_none());
}

#[test]
fn invalid_values_are_rejected() {
    let bad_timeout = FileConfig::parse("[api]\ntimeout = \"soon\"\n").unwrap();
    assert!(bad_timeout.engine_config().is_err());

    let negative = FileConfig::parse("[report]\nstale_pull_days = -1\n").unwrap();
    assert!(negative.engine_config().is_err());
}

#[test]
fn credential_debug_is_redacted() {
    let credential = AuthCredential::basic("octocat", "secret");
    let printed = format!("{credential:?}");
    assert!(!printed.contains("b2N0"));
    assert!(!printed.contains("secret"));
}
