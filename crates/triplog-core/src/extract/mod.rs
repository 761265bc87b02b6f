//! AI-assisted extraction of receipt and odometer data from photos.
//!
//! Provides a backend abstraction over OpenAI-compatible chat APIs
//! (OpenRouter, OpenAI), a retry loop with clamped exponential backoff, and
//! a parser that turns free-form model replies into typed results.

pub(crate) mod backend;
pub(crate) mod extractor;
pub(crate) mod image;
pub(crate) mod openai;
pub(crate) mod openrouter;
pub mod parse;
pub(crate) mod prompt;
pub mod retry;

pub use backend::{
    resolve_env_var, BackendFactory, ExtractionBackend, ExtractionReply, ExtractionRequest,
};
pub use extractor::{ExtractionOutcome, Extractor};
pub use image::ImageInput;
pub use openai::OpenAiBackend;
pub use openrouter::OpenRouterBackend;
pub use retry::{backoff_duration, is_retryable, with_retry, RetryConfig};
