//! The retrying extraction client.
//!
//! `Extractor` is immutable after construction: every call builds its own
//! request, runs its own retry loop, and shares nothing with concurrent calls.

use super::backend::{BackendFactory, ExtractionBackend, ExtractionRequest};
use super::image::ImageInput;
use super::parse::{parse_odometer, parse_receipt};
use super::prompt::prompt_for;
use super::retry::{with_retry, RetryConfig};
use crate::config::Config;
use crate::error::{ConfigError, ProcessingResult};
use crate::types::{DocumentKind, ExtractedOdometerReading, ExtractedReceipt, Extraction};
use std::sync::Arc;
use std::time::Instant;

/// A successful extraction plus call bookkeeping.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome<T> {
    pub value: T,
    /// Model identifier reported by the backend
    pub model: String,
    /// Backend requests made, including the successful one
    pub attempts: u32,
    /// Wall-clock time for the whole call, backoff included
    pub latency_ms: u64,
}

/// Extraction client over a single backend.
pub struct Extractor {
    backend: Arc<dyn ExtractionBackend>,
    default_retry: RetryConfig,
    max_tokens: u32,
    temperature: f32,
}

impl Extractor {
    pub fn new(backend: Box<dyn ExtractionBackend>, default_retry: RetryConfig) -> Self {
        Self {
            backend: Arc::from(backend),
            default_retry,
            max_tokens: 500,
            temperature: 0.1,
        }
    }

    /// Build an extractor from config, with optional CLI overrides.
    pub fn from_config(
        config: &Config,
        provider_override: Option<&str>,
        model_override: Option<&str>,
        api_key_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let provider = provider_override.unwrap_or(config.extraction.provider.as_str());
        let backend =
            BackendFactory::create(provider, &config.extraction, model_override, api_key_override)?;
        tracing::debug!(
            "Using extraction backend: {} (timeout {}ms)",
            backend.name(),
            backend.timeout().as_millis()
        );
        Ok(Self::new(backend, config.retry.clone())
            .with_generation(config.extraction.max_tokens, config.extraction.temperature))
    }

    /// Override generation parameters sent with every request.
    pub fn with_generation(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Extract receipt fields from a data URL or base64 image.
    pub async fn process_receipt(
        &self,
        image: &str,
        retry: Option<&RetryConfig>,
    ) -> ProcessingResult<ExtractedReceipt> {
        let image = ImageInput::parse(image)?;
        self.run(DocumentKind::Receipt, image, retry, parse_receipt)
            .await
            .map(|outcome| outcome.value)
    }

    /// Extract an odometer reading from a data URL or base64 image.
    pub async fn process_odometer(
        &self,
        image: &str,
        retry: Option<&RetryConfig>,
    ) -> ProcessingResult<ExtractedOdometerReading> {
        let image = ImageInput::parse(image)?;
        self.run(DocumentKind::Odometer, image, retry, parse_odometer)
            .await
            .map(|outcome| outcome.value)
    }

    /// Extract either document kind from an already-encoded image.
    pub async fn process(
        &self,
        kind: DocumentKind,
        image: ImageInput,
        retry: Option<&RetryConfig>,
    ) -> ProcessingResult<ExtractionOutcome<Extraction>> {
        match kind {
            DocumentKind::Receipt => {
                let outcome = self.run(kind, image, retry, parse_receipt).await?;
                Ok(map_value(outcome, Extraction::Receipt))
            }
            DocumentKind::Odometer => {
                let outcome = self.run(kind, image, retry, parse_odometer).await?;
                Ok(map_value(outcome, Extraction::Odometer))
            }
        }
    }

    async fn run<T>(
        &self,
        kind: DocumentKind,
        image: ImageInput,
        retry: Option<&RetryConfig>,
        parse: fn(&str) -> ProcessingResult<T>,
    ) -> ProcessingResult<ExtractionOutcome<T>> {
        let retry = retry.unwrap_or(&self.default_retry);
        let request = ExtractionRequest {
            image,
            prompt: prompt_for(kind).to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let start = Instant::now();
        let backend = &self.backend;
        let request = &request;
        let mut attempts = 0u32;

        let result = with_retry(retry, |attempt| {
            attempts = attempt + 1;
            async move {
                let reply = backend.complete(request).await?;
                match parse(&reply.content) {
                    Ok(value) => Ok((value, reply.model, reply.tokens_used)),
                    Err(e) => {
                        tracing::debug!("Unparseable {kind} reply: {}", reply.content);
                        Err(e)
                    }
                }
            }
        })
        .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok((value, model, tokens_used)) => {
                tracing::debug!(
                    tokens_used = ?tokens_used,
                    "{kind} extracted via {} in {latency_ms}ms ({attempts} attempt(s))",
                    backend.name()
                );
                Ok(ExtractionOutcome {
                    value,
                    model,
                    attempts,
                    latency_ms,
                })
            }
            Err(e) => {
                tracing::warn!(
                    error_kind = %e.kind(),
                    "{kind} extraction failed after {attempts} attempt(s): {e}"
                );
                Err(e)
            }
        }
    }
}

fn map_value<T, U>(outcome: ExtractionOutcome<T>, f: impl FnOnce(T) -> U) -> ExtractionOutcome<U> {
    ExtractionOutcome {
        value: f(outcome.value),
        model: outcome.model,
        attempts: outcome.attempts,
        latency_ms: outcome.latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ProcessingError};
    use crate::extract::backend::ExtractionReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

    /// A configurable mock backend for testing extractor behavior.
    ///
    /// Each call to `complete()` invokes the response factory with the current
    /// call index, allowing tests to return different results per attempt.
    struct MockBackend {
        response_fn: Box<dyn Fn(u32) -> Result<String, ProcessingError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
    }

    impl MockBackend {
        fn replying(content: &str) -> Self {
            let content = content.to_string();
            Self::from_fn(move |_| Ok(content.clone()))
        }

        fn failing_status(status: u16) -> Self {
            Self::from_fn(move |_| Err(ProcessingError::from_status(status, "mock failure")))
        }

        /// First call fails with `status`, subsequent calls reply with `content`.
        fn fail_then_reply(status: u16, content: &str) -> Self {
            let content = content.to_string();
            Self::from_fn(move |idx| {
                if idx == 0 {
                    Err(ProcessingError::from_status(status, "transient"))
                } else {
                    Ok(content.clone())
                }
            })
        }

        fn from_fn(
            f: impl Fn(u32) -> Result<String, ProcessingError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                response_fn: Box::new(f),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        /// Get a shared handle to the call counter (clone before moving the backend).
        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    #[async_trait]
    impl ExtractionBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            _request: &ExtractionRequest,
        ) -> Result<ExtractionReply, ProcessingError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            (self.response_fn)(idx).map(|content| ExtractionReply {
                content,
                model: "mock-v1".to_string(),
                tokens_used: Some(42),
            })
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(60)
        }
    }

    fn retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 10,
            max_delay_ms: 20,
            backoff_factor: 2.0,
        }
    }

    fn extractor(backend: MockBackend) -> Extractor {
        Extractor::new(Box::new(backend), retry(2))
    }

    #[tokio::test]
    async fn test_empty_image_makes_no_call() {
        let backend = MockBackend::replying(r#"{"reading": 1, "confidence": 1}"#);
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let err = extractor.process_receipt("", Some(&retry(2))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = extractor.process_odometer("", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_rate_limit_then_success() {
        let backend = MockBackend::fail_then_reply(
            429,
            r#"{"vendor": "Shell", "amount": 52.3, "confidence": 0.9}"#,
        );
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let receipt = extractor
            .process_receipt(IMAGE, Some(&retry(1)))
            .await
            .unwrap();
        assert_eq!(receipt.vendor.as_deref(), Some("Shell"));
        assert_eq!(receipt.amount, Some(52.3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rate_limit_exhausts_retries() {
        for max_retries in 0..=2 {
            let backend = MockBackend::failing_status(429);
            let calls = backend.call_count_handle();
            let extractor = extractor(backend);

            let err = extractor
                .process_odometer(IMAGE, Some(&retry(max_retries)))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RateLimited);
            assert!(err.to_string().contains("Rate limited"));
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let backend = MockBackend::failing_status(400);
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let err = extractor
            .process_receipt(IMAGE, Some(&retry(3)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_is_flat_client_error() {
        let backend = MockBackend::failing_status(401);
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let err = extractor.process_odometer(IMAGE, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_retried_and_named() {
        let backend = MockBackend::failing_status(503);
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let err = extractor.process_receipt(IMAGE, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert!(err.to_string().contains("OpenRouter/extraction API error"));
        // Default retry of this extractor allows 2 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_retried() {
        let backend = MockBackend::from_fn(|idx| {
            if idx < 2 {
                Err(ProcessingError::Network {
                    message: "connection reset".to_string(),
                })
            } else {
                Ok(r#"{"reading": 4200, "confidence": 0.7}"#.to_string())
            }
        });
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let reading = extractor.process_odometer(IMAGE, None).await.unwrap();
        assert_eq!(reading.reading, 4200.0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_odometer_comma_reading() {
        let backend = MockBackend::replying(r#"{"reading": "12,345.6", "confidence": 0.8}"#);
        let extractor = extractor(backend);

        let reading = extractor.process_odometer(IMAGE, None).await.unwrap();
        assert_eq!(reading.reading, 12345.6);
        assert_eq!(reading.confidence, 0.8);
    }

    #[tokio::test]
    async fn test_missing_reading_not_retried() {
        let backend = MockBackend::replying(r#"{"confidence": 0.1}"#);
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let err = extractor.process_odometer(IMAGE, None).await.unwrap_err();
        assert!(matches!(err, ProcessingError::MissingField { .. }));
        assert!(err.to_string().contains("No odometer reading found"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_error() {
        let backend = MockBackend::replying("Sorry, I can't read that.");
        let calls = backend.call_count_handle();
        let extractor = extractor(backend);

        let err = extractor.process_odometer(IMAGE, None).await.unwrap_err();
        assert!(matches!(err, ProcessingError::Parse { .. }));
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_reports_attempts_and_model() {
        let backend =
            MockBackend::fail_then_reply(500, r#"{"reading": 101, "confidence": 0.5}"#);
        let extractor = extractor(backend);

        let outcome = extractor
            .process(
                DocumentKind::Odometer,
                ImageInput::from_bytes(&[1, 2, 3], "jpeg"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.model, "mock-v1");
        assert_eq!(outcome.value.kind(), DocumentKind::Odometer);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_calls_do_not_interfere() {
        let backend = MockBackend::replying(r#"{"reading": 77, "confidence": 0.9}"#);
        let calls = backend.call_count_handle();
        let extractor = Arc::new(extractor(backend));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let extractor = extractor.clone();
            handles.push(tokio::spawn(async move {
                extractor.process_odometer(IMAGE, None).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().reading, 77.0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }
}
