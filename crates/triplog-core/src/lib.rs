//! Triplog Core - AI-assisted receipt and odometer extraction.
//!
//! Turns photos of expense receipts and vehicle odometers into structured
//! data for business trip tracking, by sending them to an image-understanding
//! model and parsing its reply.
//!
//! # Architecture
//!
//! ```text
//! Image → ImageInput → Extractor (retry + backoff) → Backend → Parser → typed result
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use triplog_core::{Config, Extractor};
//!
//! #[tokio::main]
//! async fn main() -> triplog_core::Result<()> {
//!     let config = Config::load()?;
//!     let extractor = Extractor::from_config(&config, None, None, None)?;
//!
//!     let reading = extractor.process_odometer(&data_url, None).await?;
//!     println!("Odometer: {}", reading.reading);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod types;

// Re-exports for convenient access
pub use batch::{BatchExtractor, BatchOptions, BatchResult, DiscoveredFile, FileDiscovery};
pub use config::Config;
pub use error::{ConfigError, ErrorKind, ProcessingError, ProcessingResult, Result, TriplogError};
pub use extract::{ExtractionOutcome, Extractor, ImageInput, RetryConfig};
pub use output::{OutputFormat, RecordWriter};
pub use types::{
    DocumentKind, ExtractedOdometerReading, ExtractedReceipt, Extraction, ExtractionRecord,
    Location,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
