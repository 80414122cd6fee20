//! Error types for Sift.
//!
//! Errors are organized by component so that callers can tell fatal
//! setup failures (config, filesystem) apart from per-request or per-chunk
//! failures that are reported and skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Sift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider call errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Batch enrichment job errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Image analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A provider is enabled but its API key could not be resolved
    #[error("{provider} API key not set. Set the {var} env var.")]
    MissingCredential { provider: String, var: String },
}

/// Errors from talking to an external generative-AI provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Selector does not name a known provider
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Network failure, non-2xx response, or unparseable payload
    #[error("{provider}: {message}")]
    Api {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Call exceeded the configured timeout
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// Provider answered but produced no text
    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },
}

impl ProviderError {
    /// Whether the upstream reported a rate-limit / quota condition.
    ///
    /// Classified by HTTP status when available, otherwise by the error
    /// markers Gemini and OpenAI-compatible APIs put in their bodies.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::Api {
                status_code,
                message,
                ..
            } => {
                if *status_code == Some(429) {
                    return true;
                }
                let lower = message.to_lowercase();
                lower.contains("resource_exhausted")
                    || lower.contains("rate limit")
                    || lower.contains("rate_limit")
            }
            _ => false,
        }
    }
}

/// Which JSON value shape an extraction was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl std::fmt::Display for JsonShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonShape::Array => write!(f, "array"),
            JsonShape::Object => write!(f, "object"),
        }
    }
}

/// Failure to pull a JSON value out of free-text model output.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No candidate of the expected shape was present
    #[error("no JSON {shape} found in response")]
    NotFound { shape: JsonShape },

    /// A candidate was found but did not deserialize into the target type
    #[error("JSON {shape} in response is malformed: {source}")]
    Malformed {
        shape: JsonShape,
        #[source]
        source: serde_json::Error,
    },
}

/// Batch enrichment job errors. All of these are fatal to the job;
/// per-chunk provider failures are reported through `ChunkOutcome` instead.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Word list could not be read
    #[error("Failed to read word list {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunk output file could not be written
    #[error("Failed to write chunk file {path}: {source}")]
    WriteChunk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunk output file could not be read back while combining
    #[error("Failed to read chunk file {path}: {message}")]
    ReadChunk { path: PathBuf, message: String },

    /// Combined output could not be written
    #[error("Failed to write combined output {path}: {source}")]
    WriteCombined {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the analysis service, each mapping to one HTTP status.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Request carried no image
    #[error("No image file provided")]
    MissingImage,

    /// Request carried no (or an empty) prompt
    #[error("No prompt provided")]
    MissingPrompt,

    /// Uploaded bytes could not be decoded or re-encoded
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Selector does not name a known provider
    #[error("Unknown model: {0}")]
    UnknownProvider(String),

    /// Provider is known but not enabled on this server
    #[error("Model not configured on this server: {0}")]
    ProviderNotConfigured(String),

    /// Upstream reported a rate-limit condition
    #[error("{0} rate limit reached, please try again later")]
    ProviderRateLimited(String),

    /// Any other upstream failure
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    /// Reply did not contain the expected JSON
    #[error("Could not extract result: {0}")]
    Extraction(#[from] ExtractError),
}

impl AnalysisError {
    /// HTTP status code this error is surfaced with.
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::MissingImage
            | AnalysisError::MissingPrompt
            | AnalysisError::InvalidImage(_)
            | AnalysisError::UnknownProvider(_)
            | AnalysisError::ProviderNotConfigured(_) => 400,
            AnalysisError::ProviderRateLimited(_) => 429,
            AnalysisError::Provider(_) | AnalysisError::Extraction(_) => 500,
        }
    }

    /// Stable machine-readable error code for the JSON envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::MissingImage => "MISSING_IMAGE",
            AnalysisError::MissingPrompt => "MISSING_PROMPT",
            AnalysisError::InvalidImage(_) => "INVALID_IMAGE",
            AnalysisError::UnknownProvider(_) => "UNKNOWN_MODEL",
            AnalysisError::ProviderNotConfigured(_) => "MODEL_NOT_CONFIGURED",
            AnalysisError::ProviderRateLimited(_) => "PROVIDER_RATE_LIMITED",
            AnalysisError::Provider(_) => "PROVIDER_ERROR",
            AnalysisError::Extraction(_) => "EXTRACTION_ERROR",
        }
    }
}

/// Convenience type alias for Sift results.
pub type Result<T> = std::result::Result<T, SiftError>;
