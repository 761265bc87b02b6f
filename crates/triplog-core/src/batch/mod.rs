//! Concurrent extraction over many image files.
//!
//! The batch extractor reads each file, runs it through the shared
//! `Extractor` with bounded concurrency (semaphore), and delivers results via
//! a callback as they complete so the CLI can stream JSONL in real time.
//! Each file is an independent top-level call with its own retry budget.

mod discovery;

pub use discovery::{DiscoveredFile, FileDiscovery};

use crate::error::ProcessingError;
use crate::extract::{ExtractionOutcome, Extractor, ImageInput, RetryConfig};
use crate::types::{DocumentKind, Extraction, ExtractionRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Configuration for the batch extractor.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum concurrent extraction calls
    pub parallel: usize,
    /// Files larger than this are failed without a request
    pub max_file_bytes: u64,
    /// Retry policy per file; `None` uses the extractor default
    pub retry: Option<RetryConfig>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: 4,
            max_file_bytes: 20 * 1024 * 1024,
            retry: None,
        }
    }
}

/// Result of extracting a single file.
#[derive(Debug)]
pub enum BatchResult {
    Success(ExtractionRecord),
    Failure(PathBuf, ProcessingError),
}

/// Concurrent extraction engine.
pub struct BatchExtractor {
    extractor: Arc<Extractor>,
    options: BatchOptions,
}

impl BatchExtractor {
    pub fn new(extractor: Arc<Extractor>, options: BatchOptions) -> Self {
        Self { extractor, options }
    }

    /// Extract a batch of files of one document kind.
    ///
    /// Spawns one tokio task per file, bounded by a semaphore. Calls
    /// `on_result` for each completed file.
    ///
    /// Returns `(succeeded, failed)` counts.
    pub async fn extract_batch<F>(
        &self,
        kind: DocumentKind,
        files: &[PathBuf],
        on_result: F,
    ) -> (usize, usize)
    where
        F: Fn(BatchResult) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.options.parallel.max(1)));
        let on_result = Arc::new(on_result);
        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Batch semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let extractor = self.extractor.clone();
            let options = self.options.clone();
            let on_result = on_result.clone();
            let path = path.clone();

            let handle = tokio::spawn(async move {
                let result = extract_single(&extractor, kind, &path, &options).await;
                let success = matches!(&result, BatchResult::Success(_));
                drop(permit); // Release concurrency permit before callback
                on_result(result);
                success
            });

            handles.push(handle);
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for handle in handles {
            match handle.await {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!("Extraction task panicked: {e}");
                    failed += 1;
                }
            }
        }

        (succeeded, failed)
    }
}

/// Extract one file: read and encode it, then run the extractor.
pub async fn extract_single(
    extractor: &Extractor,
    kind: DocumentKind,
    path: &Path,
    options: &BatchOptions,
) -> BatchResult {
    let image = match ImageInput::from_path(path, options.max_file_bytes).await {
        Ok(image) => image,
        Err(e) => return BatchResult::Failure(path.to_path_buf(), e),
    };

    match extractor.process(kind, image, options.retry.as_ref()).await {
        Ok(outcome) => BatchResult::Success(to_record(path, outcome)),
        Err(e) => BatchResult::Failure(path.to_path_buf(), e),
    }
}

fn to_record(path: &Path, outcome: ExtractionOutcome<Extraction>) -> ExtractionRecord {
    ExtractionRecord {
        file_path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extraction: outcome.value,
        model: Some(outcome.model),
        latency_ms: outcome.latency_ms,
        attempts: outcome.attempts,
    }
}
