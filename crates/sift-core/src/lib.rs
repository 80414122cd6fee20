//! Sift Core - word-list enrichment and product-label analysis over
//! generative AI providers.
//!
//! Two independent halves share the provider clients and config:
//!
//! ```text
//! words.txt → chunks → provider (stream) → JSON array → <offset>.json → combined.json
//! upload → grayscale JPEG → provider (vision) → JSON object → AnalysisResult
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sift_core::{AnalysisService, Config};
//!
//! #[tokio::main]
//! async fn main() -> sift_core::Result<()> {
//!     let config = Config::load()?;
//!     let service = AnalysisService::from_config(&config)?;
//!
//!     let bytes = std::fs::read("label.jpg")?;
//!     let result = service.analyze("gemini", bytes).await?;
//!     println!("Expires: {:?}", result.expiration_date);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod output;
pub mod service;

pub use analysis::{AnalysisResult, ProviderResult};
pub use batch::{ChunkStore, EnrichmentJob, EnrichmentRecord, JobOptions, JobSummary};
pub use config::Config;
pub use error::{AnalysisError, BatchError, ConfigError, ProviderError, Result, SiftError};
pub use llm::{LlmProvider, LlmProviderFactory, ProviderKind};
pub use output::{OutputFormat, OutputWriter};
pub use service::{AnalysisService, Endpoint, UsageSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
