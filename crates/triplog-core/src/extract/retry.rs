//! Retry utilities for transient extraction failures.
//!
//! Provides classification of retryable errors, clamped exponential backoff,
//! and the retry loop that drives a single extraction call.

use crate::error::{ErrorKind, ProcessingError, ProcessingResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry policy for one extraction call.
///
/// `initial_delay_ms <= max_delay_ms` is expected but not required; every
/// computed delay is clamped to `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Determine whether an extraction error is worth retrying.
///
/// Retryable: transport failures, rate limits (429), server errors (5xx).
/// Everything else surfaces after a single attempt.
pub fn is_retryable(error: &ProcessingError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::NetworkError | ErrorKind::RateLimited | ErrorKind::ServerError
    )
}

/// Delay before the retry that follows `attempt` (0-indexed).
///
/// `min(max_delay_ms, initial_delay_ms * backoff_factor^attempt)`.
pub fn backoff_duration(attempt: u32, config: &RetryConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = config.initial_delay_ms as f64 * config.backoff_factor.powi(exponent);
    let capped = raw.min(config.max_delay_ms as f64);
    if capped.is_nan() {
        return Duration::from_millis(config.max_delay_ms);
    }
    Duration::from_millis(capped.max(0.0).round() as u64)
}

/// Run `operation` until it succeeds, fails fatally, or the retry budget is spent.
///
/// The closure receives the 0-indexed attempt number. On exhaustion the last
/// classified error is returned unchanged.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> ProcessingResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ProcessingResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) && attempt < config.max_retries => {
                let delay = backoff_duration(attempt, config);
                tracing::info!(
                    error_kind = %e.kind(),
                    "Retry attempt {}/{} after {}ms delay",
                    attempt + 1,
                    config.max_retries,
                    delay.as_millis()
                );
                tracing::debug!("Previous attempt failed: {e}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if is_retryable(&e) && config.max_retries > 0 {
                    tracing::warn!("Giving up after {} retries: {e}", config.max_retries);
                }
                return Err(e);
            }
        }
    }
}
