//! Provider trait and request/response types.
//!
//! Defines the interface every generative-AI backend implements, the fixed
//! set of provider identifiers, and the factory that builds a provider from
//! config.

use crate::config::LlmConfig;
use crate::error::{ConfigError, ProviderError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The fixed set of providers Sift can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (multimodal text/vision)
    Gemini,
    /// Groq (OpenAI-compatible, Llama vision models)
    Groq,
    /// OpenAI Chat Completions
    Openai,
}

impl ProviderKind {
    /// All providers, in canonical order.
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Gemini, ProviderKind::Groq, ProviderKind::Openai];

    /// Parse a selector string (case-insensitive, surrounding whitespace ignored).
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        match value.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "groq" => Ok(ProviderKind::Groq),
            "openai" => Ok(ProviderKind::Openai),
            _ => Err(ProviderError::UnknownProvider(value.to_string())),
        }
    }

    /// Stable identifier used in config, CLI flags and HTTP payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
            ProviderKind::Openai => "openai",
        }
    }

    /// Env var conventionally holding this provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Openai => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base64-encoded image ready to send to a provider API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A single prompt, optionally with an attached image.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Image to analyze, if any
    pub image: Option<ImageInput>,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Text-only request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            image: None,
            prompt: prompt.into(),
            max_tokens: 8192,
            temperature: 0.7,
        }
    }

    /// Vision request: the image plus an instruction prompt.
    ///
    /// Low temperature, since the caller parses structured output from the reply.
    pub fn vision(image: ImageInput, prompt: impl Into<String>) -> Self {
        Self {
            image: Some(image),
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

/// The response from a provider call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini", "groq").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Check whether the provider is configured.
    async fn is_available(&self) -> bool;

    /// Single-shot generation. Used for image analysis.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError>;

    /// Streaming generation; fragments are concatenated into one response.
    async fn stream(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the appropriate provider from config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a provider by kind.
    ///
    /// # Arguments
    /// * `kind` - Which provider to build
    /// * `config` - The full LLM config section
    /// * `model_override` - Optional model name that overrides the config default
    ///
    /// Fails with `ConfigError::MissingCredential` when the API key does not resolve.
    pub fn create(
        kind: ProviderKind,
        config: &LlmConfig,
        model_override: Option<&str>,
    ) -> Result<Box<dyn LlmProvider>, ConfigError> {
        let missing = || ConfigError::MissingCredential {
            provider: kind.to_string(),
            var: kind.key_var().to_string(),
        };

        match kind {
            ProviderKind::Gemini => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(missing)?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::gemini::GeminiProvider::new(
                    &cfg.endpoint,
                    &api_key,
                    &model,
                )))
            }
            ProviderKind::Groq => {
                let cfg = config.groq.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(missing)?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::groq::GroqProvider::new(
                    &cfg.endpoint,
                    &api_key,
                    &model,
                )))
            }
            ProviderKind::Openai => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(missing)?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::openai::OpenAiProvider::new(
                    &cfg.endpoint,
                    &api_key,
                    &model,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(ProviderKind::parse("gemini").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::parse(" Groq ").unwrap(), ProviderKind::Groq);
        assert_eq!(ProviderKind::parse("OPENAI").unwrap(), ProviderKind::Openai);
        assert!(matches!(
            ProviderKind::parse("claude"),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_provider_kind_roundtrips_through_as_str() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_image_input_from_bytes_jpeg() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg");
        assert_eq!(input.media_type, "image/jpeg");
        assert!(!input.data.is_empty());
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        assert!(input.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_vision_request_carries_image() {
        let image = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        let request = LlmRequest::vision(image, "read the label");
        assert!(request.image.is_some());
        assert!(LlmRequest::text("hello").image.is_none());
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_SIFT_123}"), None);
    }

    #[test]
    fn test_factory_missing_credential() {
        let config = LlmConfig {
            gemini: Some(GeminiConfig {
                api_key: "${DEFINITELY_NOT_SET_SIFT_456}".to_string(),
                ..GeminiConfig::default()
            }),
            ..LlmConfig::default()
        };
        let err = LlmProviderFactory::create(ProviderKind::Gemini, &config, None)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_factory_model_override() {
        let config = LlmConfig {
            gemini: Some(GeminiConfig {
                api_key: "literal-key".to_string(),
                ..GeminiConfig::default()
            }),
            ..LlmConfig::default()
        };
        let provider =
            LlmProviderFactory::create(ProviderKind::Gemini, &config, Some("gemini-2.0-flash"))
                .unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.0-flash");
    }
}
