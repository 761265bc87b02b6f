//! Extraction backend trait and request/response types.
//!
//! Defines the interface that all extraction APIs implement, plus the
//! factory that creates the right backend from config and CLI overrides.

use super::image::ImageInput;
use crate::config::ExtractionConfig;
use crate::error::{ConfigError, ProcessingError};
use async_trait::async_trait;
use std::time::Duration;

/// A single request to an image-understanding model.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// The image to read
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// The raw reply from a backend, before parsing.
#[derive(Debug, Clone)]
pub struct ExtractionReply {
    /// Free-form text expected to contain a JSON object
    pub content: String,
    /// Model identifier reported by the API
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
}

/// Trait that all extraction backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the extractor holds an `Arc<dyn ExtractionBackend>`).
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Backend name for logging (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send one request. Implementations classify failures into
    /// `ProcessingError` variants and never retry on their own.
    async fn complete(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionReply, ProcessingError>;

    /// Per-request timeout for this backend.
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

/// Factory that creates the appropriate backend from config and overrides.
pub struct BackendFactory;

impl BackendFactory {
    /// Create an extraction backend.
    ///
    /// # Arguments
    /// * `provider` - Backend identifier ("openrouter", "openai")
    /// * `config` - The extraction config section
    /// * `model_override` - Optional model name that overrides the config default
    /// * `api_key_override` - Optional key that takes precedence over the config value
    pub fn create(
        provider: &str,
        config: &ExtractionConfig,
        model_override: Option<&str>,
        api_key_override: Option<&str>,
    ) -> Result<Box<dyn ExtractionBackend>, ConfigError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        match provider {
            "openrouter" => {
                let cfg = config.openrouter.clone().unwrap_or_default();
                let api_key = api_key_override
                    .map(String::from)
                    .or_else(|| resolve_env_var(&cfg.api_key))
                    .ok_or(ConfigError::MissingApiKey {
                        provider: "OpenRouter",
                        env_var: "OPENROUTER_API_KEY",
                    })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model.clone());
                Ok(Box::new(
                    super::openrouter::OpenRouterBackend::new(&cfg.endpoint, &api_key, &model)
                        .with_attribution(cfg.referer.as_deref(), cfg.app_title.as_deref())
                        .with_timeout(timeout),
                ))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = api_key_override
                    .map(String::from)
                    .or_else(|| resolve_env_var(&cfg.api_key))
                    .ok_or(ConfigError::MissingApiKey {
                        provider: "OpenAI",
                        env_var: "OPENAI_API_KEY",
                    })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model.clone());
                Ok(Box::new(
                    super::openai::OpenAiBackend::with_endpoint(
                        &api_key,
                        &model,
                        &super::openai::chat_completions_url(&cfg.endpoint),
                    )
                    .with_timeout(timeout),
                ))
            }
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}
