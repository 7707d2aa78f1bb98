use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chatgate(store: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.env_remove("RUST_LOG").arg("--store").arg(store);
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: chatgate [OPTIONS] [COMMAND]"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("tui"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("set-key"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("--api-url <API_URL>"))
        .stdout(predicate::str::contains("--model <MODEL>"))
        .stdout(predicate::str::contains("--store <STORE>"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_set_key_help() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("set-key")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: chatgate set-key [OPTIONS] <KEY>"));
}

#[test]
fn test_set_key_persists_credential() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");

    chatgate(&store)
        .arg("set-key")
        .arg("sk-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("API key saved"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(stored["api_Key"], "sk-test");
}

#[test]
fn test_set_key_rejects_empty_value() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");

    chatgate(&store)
        .arg("set-key")
        .arg("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key must not be empty"));
    assert!(!store.exists());
}

#[test]
fn test_logout_removes_credential() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    std::fs::write(&store, r#"{"api_Key":"sk-test"}"#).unwrap();

    chatgate(&store)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("API key removed"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    assert!(stored.get("api_Key").is_none());
}

#[test]
fn test_corrupt_store_is_reported() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    std::fs::write(&store, "not json").unwrap();

    chatgate(&store)
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read store"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_round_trip_against_mock_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Hi there"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    std::fs::write(&store, r#"{"api_Key":"sk-test"}"#).unwrap();
    let api_url = format!("{}/api/v1/chat/completions", server.uri());

    let assert = tokio::task::spawn_blocking(move || {
        chatgate(&store)
            .arg("--api-url")
            .arg(api_url)
            .arg("chat")
            .write_stdin("Hello\n")
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("ChatGPT: Hi there"));
}
