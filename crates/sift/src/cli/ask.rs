//! The `sift ask` command: one free-text prompt, reply on stdout.

use clap::Args;
use sift_core::llm::LlmRequest;
use sift_core::{Config, LlmProviderFactory, ProviderKind};

use super::types::Provider;

/// Arguments for the `ask` command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Prompt text
    #[arg(required = true)]
    pub prompt: String,

    /// Provider to ask
    #[arg(short, long, value_enum, default_value = "gemini")]
    pub provider: Provider,

    /// Model name (provider-specific)
    #[arg(short, long)]
    pub model: Option<String>,
}

pub async fn execute(args: AskArgs, config: &Config) -> anyhow::Result<()> {
    anyhow::ensure!(!args.prompt.trim().is_empty(), "Prompt must not be empty");

    let kind = ProviderKind::from(args.provider);
    let provider = LlmProviderFactory::create(kind, &config.llm, args.model.as_deref())?;

    let request = LlmRequest::text(args.prompt);
    let timeout = std::time::Duration::from_millis(config.limits.llm_timeout_ms);
    let response = tokio::time::timeout(timeout, provider.stream(&request))
        .await
        .map_err(|_| anyhow::anyhow!("{kind} did not answer within {}ms", timeout.as_millis()))??;

    tracing::debug!(
        provider = %kind,
        model = %response.model,
        latency_ms = response.latency_ms,
        "Prompt answered"
    );
    println!("{}", response.text);
    Ok(())
}
