//! CLI enum types shared by the subcommands: provider and combined format.

use clap::ValueEnum;
use sift_core::{OutputFormat, ProviderKind};

/// Supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Google Gemini
    Gemini,
    /// Groq (OpenAI-compatible)
    Groq,
    /// OpenAI
    Openai,
}

impl From<Provider> for ProviderKind {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Gemini => ProviderKind::Gemini,
            Provider::Groq => ProviderKind::Groq,
            Provider::Openai => ProviderKind::Openai,
        }
    }
}

/// Combined output layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Jsonl => OutputFormat::JsonLines,
        }
    }
}
