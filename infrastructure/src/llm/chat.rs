//! Minimal chat-completions HTTP client.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors from the chat endpoint.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    Http(String),

    #[error("Malformed chat response")]
    MalformedResponse,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key,
        }
    }

    /// Send one user prompt and return the assistant's text reply.
    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError> {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        debug!(model, prompt_length = prompt.len(), "Sending chat completion request");

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Http(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;

        payload
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|s| s.trim().to_string())
            .ok_or(ChatError::MalformedResponse)
    }
}
