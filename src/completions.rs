use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::Config;
use crate::conversation::Turn;
use crate::credential::Credential;

// Body of POST /chat/completions
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

/// Only `choices[0].message.content` is ever read; everything else is ignored.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request failed with status code {}", .status.as_u16())]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
}

impl ClientError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            ClientError::Transport(_) => None,
        }
    }
}

// `message` at the top level, else the OpenAI-style `error.message`.
fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| value.pointer("/error/message").and_then(|m| m.as_str()))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct CompletionsClient {
    http: Client,
    api_url: String,
    model: String,
}

impl CompletionsClient {
    /// No request timeout is configured; the transport default applies.
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Sends `messages` as-is and returns the decoded response.
    ///
    /// A 2xx body that is not a JSON completion is returned as an empty
    /// response rather than an error, so callers fall back to the default reply.
    #[instrument(skip(self, credential, messages), fields(url = %self.api_url, turns = messages.len()))]
    pub async fn complete(
        &self,
        credential: &Credential,
        messages: &[Turn],
    ) -> Result<CompletionResponse, ClientError> {
        let payload = CompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(credential.expose())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(%status, %body, "Chat completion request failed");
            return Err(ClientError::Status {
                status,
                message: error_message_from_body(&body),
            });
        }

        debug!(bytes = body.len(), "Received chat completion response");
        match serde_json::from_str::<CompletionResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!(error = %e, "Completion body did not match the expected shape");
                Ok(CompletionResponse::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_content() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"message":{"role":"assistant","content":"Hi there"}},{"message":{"content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_content(), Some("Hi there"));
    }

    #[test]
    fn test_first_content_missing_pieces() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
        ] {
            let response: CompletionResponse = serde_json::from_str(body).unwrap();
            assert_eq!(response.first_content(), None, "body: {}", body);
        }
    }

    #[test]
    fn test_request_body_shape() {
        let turns = vec![Turn::user("Hello"), Turn::assistant("Hi"), Turn::user("Again")];
        let body = serde_json::to_value(CompletionRequest {
            model: "m",
            messages: &turns,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "m",
                "messages": [
                    {"role": "user", "content": "Hello"},
                    {"role": "assistant", "content": "Hi"},
                    {"role": "user", "content": "Again"}
                ]
            })
        );
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message_from_body(r#"{"message":"Invalid API key"}"#).as_deref(),
            Some("Invalid API key")
        );
        assert_eq!(
            error_message_from_body(r#"{"error":{"message":"No auth credentials found","code":401}}"#)
                .as_deref(),
            Some("No auth credentials found")
        );
        assert_eq!(
            error_message_from_body(r#"{"message":"top","error":{"message":"nested"}}"#).as_deref(),
            Some("top")
        );
        assert_eq!(error_message_from_body("<html>bad gateway</html>"), None);
        assert_eq!(error_message_from_body(r#"{"message":""}"#), None);
    }

    #[test]
    fn test_status_error_display() {
        let err = ClientError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: None,
        };
        assert_eq!(err.to_string(), "Request failed with status code 401");
        assert_eq!(err.server_message(), None);
    }
}
