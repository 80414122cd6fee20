//! Provider integration.
//!
//! Provides a provider abstraction over multiple generative-AI backends
//! (Gemini, Groq, OpenAI) with single-shot and streaming generation.

pub(crate) mod gemini;
pub(crate) mod groq;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod sse;

pub use provider::{
    resolve_env_var, ImageInput, LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse,
    ProviderKind,
};
