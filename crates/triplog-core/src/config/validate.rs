//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.timeout_ms must be > 0".into(),
            ));
        }
        if self.extraction.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.max_tokens must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.extraction.temperature) {
            return Err(ConfigError::ValidationError(
                "extraction.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.backoff_factor must be a finite number >= 1.0".into(),
            ));
        }
        if self.batch.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "batch.parallel must be > 0".into(),
            ));
        }
        if self.batch.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "batch.max_file_size_mb must be > 0".into(),
            ));
        }
        Ok(())
    }
}
