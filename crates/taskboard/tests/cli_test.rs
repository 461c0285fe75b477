//! Integration tests for the `taskboard` CLI binary.
//!
//! Argument parsing, help output, completions, and config handling run
//! offline; backend commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `taskboard` binary with env isolation.
///
/// Clears all `TASKBOARD_*` env vars and points config and data
/// directories into `home` so tests never touch real configuration.
fn taskboard_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("taskboard");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("TASKBOARD_CONFIG", home.join("config.toml"))
        .env("TASKBOARD_TOKEN_FILE", home.join("session.json"))
        .env_remove("TASKBOARD_BASE_URL")
        .env_remove("TASKBOARD_TOKEN")
        .env_remove("TASKBOARD_OUTPUT")
        .env_remove("TASKBOARD_TIMEOUT")
        .env_remove("TASKBOARD_TOKEN_STORAGE")
        .env_remove("RUST_LOG");
    cmd
}

fn user_json() -> serde_json::Value {
    json!({ "id": 3, "name": "Ada", "email": "ada@example.com", "role": "admin" })
}

fn page_json(data: serde_json::Value) -> serde_json::Value {
    json!({
        "data": data,
        "meta": { "current_page": 1, "last_page": 1, "per_page": 10, "total": 1, "links": [] },
        "links": {}
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = taskboard_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("projects")
            .and(predicate::str::contains("tasks"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("taskboard"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_status_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["tasks", "--project", "1", "list", "--status", "blocked"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("in_progress"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_override() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["config", "set", "base_url", "https://board.example.com/api"])
        .assert()
        .success();
    taskboard_cmd(home.path())
        .args(["config", "set", "timeout", "12"])
        .assert()
        .success();

    taskboard_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://board.example.com/api")
                .and(predicate::str::contains("timeout = 12")),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2);
}

#[test]
fn test_bad_base_url_is_config_error() {
    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["--base-url", "not a url", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
}

// ── Backend commands ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "s3cret" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": user_json(), "token": "tok-42" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "login", "--email", "ada@example.com", "--password-stdin"])
        .write_stdin("s3cret\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged in as Ada"));

    let raw = std::fs::read_to_string(home.path().join("session.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["authToken"], "tok-42");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_uses_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer tok-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": user_json() })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("session.json"), r#"{"authToken":"tok-7"}"#).unwrap();

    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "-o", "json", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ada@example.com"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_signed_out_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "whoami"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("taskboard login"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_forgets_token_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let token_file = home.path().join("session.json");
    std::fs::write(&token_file, r#"{"authToken":"tok-7"}"#).unwrap();

    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "logout"])
        .assert()
        .success();
    assert!(!token_file.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_project_reports_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The end date must be after the start date.",
            "errors": { "end_date": ["The end date must be after the start date."] }
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args([
            "--base-url", &server.uri(),
            "projects", "create",
            "--title", "Launch",
            "--start-date", "2024-05-01",
            "--end-date", "2024-04-01",
        ])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("end_date"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_project_list_plain_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(json!([
            { "id": 11, "title": "Launch", "start_date": "2024-05-01", "end_date": "2024-06-01" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "-o", "plain", "projects", "list", "--page", "2", "-l", "5"])
        .assert()
        .success()
        .stdout(predicate::str::diff("11\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_sends_only_last_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("search", "launch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(json!([
            { "id": 11, "title": "Launch", "start_date": "2024-05-01", "end_date": "2024-06-01" }
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(json!([]))))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "-o", "plain", "projects", "search"])
        .write_stdin("l\nla\nlaunch\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("11"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_requires_yes_when_not_interactive() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    taskboard_cmd(home.path())
        .args(["--base-url", &server.uri(), "projects", "delete", "4"])
        .write_stdin("")
        .assert()
        .code(2);
}
