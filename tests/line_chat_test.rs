use std::io::Cursor;

use chatgate::chat::run_line_chat;
use chatgate::{Config, CredentialGate, FileStore, KeyValueStore, MemoryStore};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        api_url: format!("{}/api/v1/chat/completions", server.uri()),
        ..Default::default()
    }
}

async fn mount_reply(server: &MockServer, credential: &str, reply: &str) {
    Mock::given(method("POST"))
        .and(header("authorization", format!("Bearer {}", credential).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": reply}}]
        })))
        .mount(server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_stored_key_skips_prompt() {
    let server = MockServer::start().await;
    mount_reply(&server, "sk-test", "Hi there").await;

    let mut gate = CredentialGate::load(Box::new(MemoryStore::with_entry("api_Key", "sk-test"))).unwrap();
    let mut output = Vec::new();
    let exchanges = run_line_chat(&config_for(&server), &mut gate, Cursor::new("Hello\n"), &mut output)
        .await
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert_eq!(exchanges, 1);
    assert!(!output.contains("API Key"));
    assert!(output.contains("ChatGPT: Hi there"));
}

#[tokio::test]
async fn test_prompts_until_key_is_given_and_persists_it() {
    let server = MockServer::start().await;
    mount_reply(&server, "sk-typed", "Hi there").await;

    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("store.json");
    let mut gate = CredentialGate::load(Box::new(FileStore::new(&store_path))).unwrap();
    assert!(gate.is_open());

    let mut output = Vec::new();
    let input = Cursor::new("\nsk-typed\nHello\n");
    let exchanges = run_line_chat(&config_for(&server), &mut gate, input, &mut output)
        .await
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert_eq!(exchanges, 1);
    assert!(output.contains("An API key is required."));
    // A plain read cannot mask the key, so the prompt says so.
    assert!(output.contains("API Key (input is visible): "));
    assert!(output.contains("ChatGPT: Hi there"));
    assert_eq!(
        FileStore::new(&store_path).get("api_Key").unwrap().as_deref(),
        Some("sk-typed")
    );
}

#[tokio::test]
async fn test_blank_lines_are_not_sent() {
    let server = MockServer::start().await;
    mount_reply(&server, "sk-test", "ok").await;

    let mut gate = CredentialGate::load(Box::new(MemoryStore::with_entry("api_Key", "sk-test"))).unwrap();
    let mut output = Vec::new();
    let input = Cursor::new("one\n\n   \ntwo\n");
    let exchanges = run_line_chat(&config_for(&server), &mut gate, input, &mut output)
        .await
        .unwrap();

    assert_eq!(exchanges, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_eof_at_key_prompt_ends_quietly() {
    let server = MockServer::start().await;
    let mut gate = CredentialGate::load(Box::new(MemoryStore::new())).unwrap();
    let mut output = Vec::new();

    let exchanges = run_line_chat(&config_for(&server), &mut gate, Cursor::new(""), &mut output)
        .await
        .unwrap();

    assert_eq!(exchanges, 0);
    assert!(gate.is_open());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_assistant_name_labels_replies() {
    let server = MockServer::start().await;
    mount_reply(&server, "sk-test", "Bonjour").await;

    let config = Config {
        assistant_name: "Mistral".to_string(),
        ..config_for(&server)
    };
    let mut gate = CredentialGate::load(Box::new(MemoryStore::with_entry("api_Key", "sk-test"))).unwrap();
    let mut output = Vec::new();
    run_line_chat(&config, &mut gate, Cursor::new("Salut\n"), &mut output)
        .await
        .unwrap();

    assert!(String::from_utf8(output).unwrap().contains("Mistral: Bonjour"));
}
