//! # Chat Completion
//!
//! One round trip per question: a system instruction plus a single user turn
//! go out, one generated reply comes back. No streaming, no history.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Completion API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response had no reply")]
    EmptyReply,

    #[error("Completion API key is not configured")]
    MissingKey,
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        if self.api_key.is_empty() {
            return Err(CompletionError::MissingKey);
        }

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        let response: ChatResponse = res.json().await?;

        first_reply(response)
    }
}

fn first_reply(response: ChatResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::EmptyReply)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "be nice",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "be nice" },
                    { "role": "user", "content": "hi" },
                ],
            })
        );
    }

    #[test]
    fn test_first_reply_is_returned_verbatim() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "<b>Hi</b>" } },
                { "index": 1, "message": { "role": "assistant", "content": "ignored" } },
            ],
        }))
        .unwrap();

        assert_eq!(first_reply(response).unwrap(), "<b>Hi</b>");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_a_request() {
        let client = OpenAiClient::new("", "gpt-4o-mini", "http://127.0.0.1:9");

        assert!(matches!(
            client.complete("be nice", "hi").await,
            Err(CompletionError::MissingKey)
        ));
    }

    #[test]
    fn test_no_choices_is_an_error() {
        let response: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();

        assert!(matches!(
            first_reply(response),
            Err(CompletionError::EmptyReply)
        ));
    }
}
