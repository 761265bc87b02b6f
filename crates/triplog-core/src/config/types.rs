//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Extraction backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Backend to use: "openrouter" or "openai"
    pub provider: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum tokens the model may generate per reply
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// OpenRouter configuration
    pub openrouter: Option<OpenRouterConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            timeout_ms: 60_000,
            max_tokens: 500,
            temperature: 0.1,
            openrouter: Some(OpenRouterConfig::default()),
            openai: None,
        }
    }
}

/// OpenRouter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    /// API base URL (`/chat/completions` is appended)
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Value sent as `HTTP-Referer` for OpenRouter attribution
    pub referer: Option<String>,

    /// Value sent as `X-Title` for OpenRouter attribution
    pub app_title: Option<String>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            api_key: "${OPENROUTER_API_KEY}".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            referer: None,
            app_title: Some("triplog".to_string()),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL (`/chat/completions` is appended)
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

/// Batch extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum concurrent extraction calls
    pub parallel: usize,

    /// Image extensions picked up when scanning a directory
    pub supported_formats: Vec<String>,

    /// Images larger than this are rejected before upload
    pub max_file_size_mb: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: 4,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
            ],
            max_file_size_mb: 20,
        }
    }
}

impl BatchConfig {
    /// Size limit in bytes. Saturates rather than overflowing for huge values.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
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
