//! Groq provider (OpenAI-compatible API).
//!
//! Groq uses the same Chat Completions format as OpenAI,
//! so this delegates to `OpenAiProvider` with a custom endpoint.

use super::openai::OpenAiProvider;
use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::time::Duration;

/// Groq provider wrapping an OpenAI-compatible endpoint.
pub struct GroqProvider {
    inner: OpenAiProvider,
}

impl GroqProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            inner: OpenAiProvider::named("groq", endpoint, api_key, model),
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        self.inner.generate(request).await
    }

    async fn stream(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
        self.inner.stream(request).await
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}
