//! End-to-end CLI tests for the guarded-fetch binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Binary isolated from the user's config file and log settings.
fn guarded_fetch(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("guarded-fetch").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let config_home = TempDir::new().unwrap();
    guarded_fetch(&config_home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout-ms"));
}

#[test]
fn test_binary_version_displays_version() {
    let config_home = TempDir::new().unwrap();
    guarded_fetch(&config_home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("guarded-fetch"));
}

#[test]
fn test_binary_missing_url_is_usage_error() {
    let config_home = TempDir::new().unwrap();
    guarded_fetch(&config_home)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_empty_url_exits_with_code_two() {
    let config_home = TempDir::new().unwrap();
    guarded_fetch(&config_home)
        .arg("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("remote address must not be empty"));
}

#[test]
fn test_binary_invalid_config_file_exits_with_code_two() {
    let config_home = TempDir::new().unwrap();
    let config_dir = config_home.path().join("guarded-fetch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "connect_timeout_secs = 0\n").unwrap();

    guarded_fetch(&config_home)
        .arg("https://example.invalid/file.bin")
        .assert()
        .code(2);
}

#[test]
fn test_binary_existing_output_short_circuits() {
    let config_home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("present.bin");
    std::fs::write(&output, b"cached").unwrap();

    guarded_fetch(&config_home)
        .args(["https://example.invalid/present.bin", "--json", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"short_circuited\": true"));
}

#[tokio::test]
async fn test_binary_downloads_and_prints_json_summary() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body".to_vec()))
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("report.pdf");
    let url = format!("{}/report.pdf", server.uri());

    let mut cmd = guarded_fetch(&config_home);
    cmd.args([url.as_str(), "--json", "-o"]).arg(&output);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""));
    assert_eq!(std::fs::read(&output).unwrap(), b"%PDF-1.4 body");
}

#[tokio::test]
async fn test_binary_http_error_exits_with_code_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/gone.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("gone.bin");
    let url = format!("{}/gone.bin", server.uri());

    let mut cmd = guarded_fetch(&config_home);
    cmd.args([url.as_str(), "--no-progress", "-o"]).arg(&output);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .code(1)
        .stderr(predicate::str::contains("Download failed: HTTP 404"));
    assert!(!output.exists());
}
