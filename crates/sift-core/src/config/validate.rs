//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::llm::ProviderKind;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "batch.chunk_size must be > 0".into(),
            ));
        }
        if self.batch.delay_min_ms > self.batch.delay_max_ms {
            return Err(ConfigError::ValidationError(
                "batch.delay_min_ms must be <= batch.delay_max_ms".into(),
            ));
        }
        if self.batch.combined_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "batch.combined_file must not be empty".into(),
            ));
        }
        if ProviderKind::parse(&self.batch.provider).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "batch.provider '{}' is not a known provider",
                self.batch.provider
            )));
        }
        if self.server.providers.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.providers must list at least one provider".into(),
            ));
        }
        for name in &self.server.providers {
            if ProviderKind::parse(name).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "server.providers entry '{name}' is not a known provider"
                )));
            }
        }
        if self.server.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_mb must be > 0".into(),
            ));
        }
        if self.rate_limit.max_requests > 0 && self.rate_limit.window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.window_secs must be > 0".into(),
            ));
        }
        if self.image.jpeg_quality == 0 || self.image.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "image.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.image.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "image.max_dimension must be > 0".into(),
            ));
        }
        if self.image.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "image.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
