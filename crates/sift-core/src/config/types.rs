//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Batch enrichment job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Words sent per provider request
    pub chunk_size: usize,

    /// Directory that holds one `<offset>.json` file per chunk
    pub output_dir: PathBuf,

    /// File name (inside `output_dir`) of the concatenated result
    pub combined_file: String,

    /// Lower bound of the random pause between chunks
    pub delay_min_ms: u64,

    /// Upper bound of the random pause between chunks
    pub delay_max_ms: u64,

    /// Provider used for enrichment ("gemini", "groq", "openai")
    pub provider: String,

    /// Output-format template options
    pub prompt: PromptConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            output_dir: PathBuf::from("./sift-output"),
            combined_file: "combined.json".to_string(),
            delay_min_ms: 2000,
            delay_max_ms: 6000,
            provider: "gemini".to_string(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Template options for the enrichment prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Ask for an IPA transcription per word
    pub include_phonetics: bool,

    /// Ask for example sentence pairs per word
    pub include_examples: bool,

    /// Add instructions for all-caps acronyms and misspelled entries
    pub handle_irregular: bool,

    /// Language the `translation` field is written in
    pub target_language: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_phonetics: true,
            include_examples: false,
            handle_irregular: true,
            target_language: "Chinese".to_string(),
        }
    }
}

/// HTTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Providers served, in the order `/compareAnalyze` reports them
    pub providers: Vec<String>,

    /// Maximum accepted request body in megabytes
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            providers: vec!["gemini".to_string(), "groq".to_string()],
            max_upload_mb: 16,
        }
    }
}

/// Fixed-window request cap per caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window (0 disables limiting)
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

/// Image preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// JPEG quality (1-100) used when re-encoding uploads
    pub jpeg_quality: u8,

    /// Maximum accepted width or height
    pub max_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            max_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Resource limits for outbound calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Provider call timeout in milliseconds
    pub llm_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 120_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Google Gemini configuration
    pub gemini: Option<GeminiConfig>,

    /// Groq (OpenAI-compatible) configuration
    pub groq: Option<GroqConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

/// Groq configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            api_key: "${GROQ_API_KEY}".to_string(),
            model: "llama-3.2-90b-vision-preview".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}
