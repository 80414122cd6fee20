//! The analysis service context shared by every HTTP request.
//!
//! `AnalysisService` is constructed once at startup and owns the provider
//! clients (in the fixed order comparisons report them), the upload
//! preprocessor, the usage counters and the rate limiter.

pub mod counters;
pub mod rate_limit;

pub use counters::{Endpoint, UsageCounters, UsageSnapshot};
pub use rate_limit::{RateLimiter, RetryAfter};

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::analysis::{label_prompt, AnalysisResult, Preprocessor, ProviderResult};
use crate::config::Config;
use crate::error::{AnalysisError, ConfigError, JsonShape, ProviderError};
use crate::extract::extract_json;
use crate::llm::{ImageInput, LlmProvider, LlmProviderFactory, LlmRequest, ProviderKind};

/// Provider clients plus per-process state for the relay.
pub struct AnalysisService {
    providers: Vec<(ProviderKind, Arc<dyn LlmProvider>)>,
    preprocessor: Preprocessor,
    counters: UsageCounters,
    limiter: RateLimiter,
    llm_timeout: Duration,
}

impl AnalysisService {
    /// Build from already-constructed providers.
    pub fn new(providers: Vec<(ProviderKind, Arc<dyn LlmProvider>)>, config: &Config) -> Self {
        Self {
            providers,
            preprocessor: Preprocessor::new(config.image.clone()),
            counters: UsageCounters::new(),
            limiter: RateLimiter::new(&config.rate_limit),
            llm_timeout: Duration::from_millis(config.limits.llm_timeout_ms),
        }
    }

    /// Build every provider listed in `server.providers`.
    ///
    /// A provider whose API key does not resolve is a fatal config error.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut providers: Vec<(ProviderKind, Arc<dyn LlmProvider>)> = Vec::new();
        for name in &config.server.providers {
            let kind = ProviderKind::parse(name)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
            if providers.iter().any(|(k, _)| *k == kind) {
                tracing::warn!("Provider '{kind}' listed twice in server.providers, ignoring duplicate");
                continue;
            }
            let provider = LlmProviderFactory::create(kind, &config.llm, None)?;
            tracing::info!(provider = %kind, model = provider.model(), "Provider configured");
            providers.push((kind, Arc::from(provider)));
        }
        Ok(Self::new(providers, config))
    }

    /// Configured providers, in comparison order.
    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|(k, _)| *k).collect()
    }

    pub fn counters(&self) -> &UsageCounters {
        &self.counters
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Resolve a selector string to a configured provider.
    fn provider(&self, selector: &str) -> Result<(ProviderKind, Arc<dyn LlmProvider>), AnalysisError> {
        let kind = ProviderKind::parse(selector)
            .map_err(|_| AnalysisError::UnknownProvider(selector.to_string()))?;
        self.providers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(k, p)| (*k, p.clone()))
            .ok_or_else(|| AnalysisError::ProviderNotConfigured(kind.to_string()))
    }

    /// Analyze one uploaded image with the selected provider.
    ///
    /// Errors are checked in order: missing image, provider selector,
    /// image decoding, provider call, JSON extraction.
    pub async fn analyze(&self, selector: &str, image: Vec<u8>) -> Result<AnalysisResult, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::MissingImage);
        }
        let (_, provider) = self.provider(selector)?;
        let input = self.preprocessor.prepare(image).await?;
        analyze_with(provider, input, self.llm_timeout).await
    }

    /// Analyze one uploaded image with every configured provider concurrently.
    ///
    /// Results keep provider order. A provider that fails (or whose task
    /// panics) contributes an all-null result instead of failing the call;
    /// only a missing or undecodable image fails the whole comparison.
    pub async fn compare(&self, image: Vec<u8>) -> Result<Vec<ProviderResult>, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::MissingImage);
        }
        let input = self.preprocessor.prepare(image).await?;

        let handles: Vec<_> = self
            .providers
            .iter()
            .map(|(_, provider)| {
                let provider = provider.clone();
                let input = input.clone();
                let timeout = self.llm_timeout;
                tokio::spawn(async move { analyze_with(provider, input, timeout).await })
            })
            .collect();

        let joined = join_all(handles).await;

        let results = self
            .providers
            .iter()
            .zip(joined)
            .map(|((kind, _), outcome)| match outcome {
                Ok(Ok(result)) => ProviderResult {
                    provider: *kind,
                    result,
                    error: None,
                },
                Ok(Err(e)) => {
                    tracing::warn!(provider = %kind, "Comparison slot failed: {e}");
                    ProviderResult {
                        provider: *kind,
                        result: AnalysisResult::default(),
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => {
                    tracing::error!(provider = %kind, "Comparison task panicked: {e}");
                    ProviderResult {
                        provider: *kind,
                        result: AnalysisResult::default(),
                        error: Some(format!("task failed: {e}")),
                    }
                }
            })
            .collect();

        Ok(results)
    }

    /// Forward a free-text prompt and return the streamed reply verbatim.
    pub async fn ask(&self, selector: &str, prompt: &str) -> Result<String, AnalysisError> {
        if prompt.trim().is_empty() {
            return Err(AnalysisError::MissingPrompt);
        }
        let (_, provider) = self.provider(selector)?;
        let request = LlmRequest::text(prompt);
        let response = call_with_timeout(provider.as_ref(), self.llm_timeout, true, &request).await?;
        Ok(response.text)
    }
}

/// Run one vision call and extract an `AnalysisResult` from the reply.
async fn analyze_with(
    provider: Arc<dyn LlmProvider>,
    image: ImageInput,
    timeout: Duration,
) -> Result<AnalysisResult, AnalysisError> {
    let today = chrono::Local::now().format("%d/%m/%Y").to_string();
    let request = LlmRequest::vision(image, label_prompt(&today));

    let response = call_with_timeout(provider.as_ref(), timeout, false, &request).await?;
    let result: AnalysisResult = extract_json(&response.text, JsonShape::Object)?;
    Ok(result)
}

/// Call `generate` (or `stream`) bounded by `timeout`, classifying
/// rate-limit failures separately from other provider errors.
async fn call_with_timeout(
    provider: &dyn LlmProvider,
    timeout: Duration,
    stream: bool,
    request: &LlmRequest,
) -> Result<crate::llm::LlmResponse, AnalysisError> {
    let start = Instant::now();
    let call = async {
        if stream {
            provider.stream(request).await
        } else {
            provider.generate(request).await
        }
    };

    let outcome = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider: provider.name().to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    };

    match outcome {
        Ok(response) => {
            tracing::debug!(
                provider = provider.name(),
                model = %response.model,
                latency_ms = start.elapsed().as_millis() as u64,
                "Provider call succeeded"
            );
            Ok(response)
        }
        Err(e) if e.is_rate_limited() => {
            tracing::warn!(provider = provider.name(), "Provider rate limited: {e}");
            Err(AnalysisError::ProviderRateLimited(provider.name().to_string()))
        }
        Err(e) => Err(AnalysisError::Provider(e)),
    }
}
