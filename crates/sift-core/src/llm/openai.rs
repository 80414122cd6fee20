//! OpenAI provider using the Chat Completions API.
//!
//! Sends the image via data URL in the user message content array. Also
//! serves any OpenAI-compatible endpoint (see `groq.rs`).

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use super::sse;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    name: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiProvider {
    /// Create a provider against `<base_url>/chat/completions`.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self::named("openai", base_url, api_key, model)
    }

    /// Create under a different provider name (used by OpenAI-compatible wrappers).
    pub fn named(name: &str, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    fn body(&self, request: &LlmRequest, stream: bool) -> ChatRequest {
        let mut content = Vec::with_capacity(2);
        if let Some(image) = &request.image {
            content.push(ChatContent::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            });
        }
        content.push(ChatContent::Text {
            text: request.prompt.clone(),
        });

        ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response, ProviderError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {e}"), None))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(self.error(format!("HTTP {status}: {text}"), Some(status.as_u16())));
        }
        Ok(resp)
    }

    fn error(&self, message: String, status_code: Option<u16>) -> ProviderError {
        ProviderError::Api {
            provider: self.name.clone(),
            message,
            status_code,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

/// Pull the text fragment out of one streamed payload.
fn parse_stream_payload(payload: &str) -> Result<Option<String>, String> {
    let chunk: StreamChunk =
        serde_json::from_str(payload).map_err(|e| format!("stream payload invalid: {e}"))?;
    if let Some(error) = chunk.error {
        return Err(error.message);
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        let start = Instant::now();
        let resp = self.send(&self.body(request, false)).await?;

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .map_err(|e| self.error(format!("failed to parse response: {e}"), None))?;

        let text = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: self.name.clone(),
            })?;

        Ok(LlmResponse {
            text: text.trim().to_string(),
            model: chat_resp.model,
            tokens_used: chat_resp.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        let start = Instant::now();
        let resp = self.send(&self.body(request, true)).await?;

        let text = sse::collect_stream(&self.name, resp, |payload| {
            parse_stream_payload(payload).map_err(|message| self.error(message, None))
        })
        .await?;

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: self.name.clone(),
            });
        }

        Ok(LlmResponse {
            text,
            model: self.model.clone(),
            tokens_used: None,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}
