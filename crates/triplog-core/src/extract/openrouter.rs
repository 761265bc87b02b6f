//! OpenRouter extraction backend (OpenAI-compatible API).
//!
//! OpenRouter speaks the same Chat Completions format as OpenAI, so this
//! delegates to `OpenAiBackend` with a custom endpoint and the optional
//! attribution headers OpenRouter reads.

use super::backend::{ExtractionBackend, ExtractionReply, ExtractionRequest};
use super::openai::{chat_completions_url, OpenAiBackend};
use crate::error::ProcessingError;
use async_trait::async_trait;
use std::time::Duration;

/// OpenRouter backend wrapping an OpenAI-compatible endpoint.
pub struct OpenRouterBackend {
    inner: OpenAiBackend,
}

impl OpenRouterBackend {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            inner: OpenAiBackend::with_endpoint(api_key, model, &chat_completions_url(endpoint)),
        }
    }

    /// Set the `HTTP-Referer` and `X-Title` headers used for app attribution.
    pub fn with_attribution(mut self, referer: Option<&str>, title: Option<&str>) -> Self {
        if let Some(referer) = referer {
            self.inner = self.inner.with_header("HTTP-Referer", referer);
        }
        if let Some(title) = title {
            self.inner = self.inner.with_header("X-Title", title);
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl ExtractionBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionReply, ProcessingError> {
        self.inner.complete(request).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openrouter_endpoint() {
        let backend = OpenRouterBackend::new("https://openrouter.ai/api/v1", "k", "m");
        assert_eq!(
            backend.inner.endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(backend.name(), "openrouter");
    }
}
