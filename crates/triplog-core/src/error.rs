//! Error types for triplog extraction.
//!
//! `ProcessingError` is the per-call failure surfaced by the extraction client.
//! Every variant maps to a stable [`ErrorKind`] so callers can branch on the
//! failure class without inspecting message text.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Top-level error type for triplog operations.
#[derive(Error, Debug)]
pub enum TriplogError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extraction call failures
    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// No API key could be resolved for the selected provider
    #[error("{provider} API key not set. Set {env_var} env var.")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    /// Provider name is not one of the supported backends
    #[error("Unknown extraction provider: {0}")]
    UnknownProvider(String),
}

/// Failure class of a [`ProcessingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NetworkError,
    RateLimited,
    ServerError,
    ClientError,
    ParseError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ClientError => "client_error",
            ErrorKind::ParseError => "parse_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a single extraction call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    /// The image argument was empty or unusable; no request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request could not be sent or the response could not be received
    #[error("Network error contacting extraction API: {message}")]
    Network { message: String },

    /// HTTP 429 from the extraction endpoint
    #[error("Rate limited by extraction API (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },

    /// HTTP 5xx from the extraction endpoint
    #[error("OpenRouter/extraction API error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// HTTP 4xx (other than 429) from the extraction endpoint
    #[error("Extraction API rejected the request (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    /// The model reply did not contain a usable JSON object
    #[error("{message}")]
    Parse { message: String },

    /// The reply parsed but a required field was absent
    #[error("{message}")]
    MissingField {
        field: &'static str,
        message: String,
    },
}

impl ProcessingError {
    /// Failure class, stable across message wording changes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProcessingError::Network { .. } => ErrorKind::NetworkError,
            ProcessingError::RateLimited { .. } => ErrorKind::RateLimited,
            ProcessingError::Server { .. } => ErrorKind::ServerError,
            ProcessingError::Client { .. } => ErrorKind::ClientError,
            ProcessingError::Parse { .. } | ProcessingError::MissingField { .. } => {
                ErrorKind::ParseError
            }
        }
    }

    /// HTTP status that produced this error, if it came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProcessingError::RateLimited { status, .. }
            | ProcessingError::Server { status, .. }
            | ProcessingError::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a non-success HTTP status into the matching error variant.
    ///
    /// Callers only pass non-2xx statuses; anything outside 4xx/5xx is
    /// treated as a client error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            "no response body".to_string()
        } else {
            body.trim().to_string()
        };
        match status {
            429 => ProcessingError::RateLimited { status, message },
            500..=599 => ProcessingError::Server { status, message },
            _ => ProcessingError::Client { status, message },
        }
    }
}

/// Convenience type alias for triplog results.
pub type Result<T> = std::result::Result<T, TriplogError>;

/// Convenience type alias for extraction call results.
pub type ProcessingResult<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert_eq!(
            ProcessingError::from_status(429, "slow down").kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(
            ProcessingError::from_status(502, "bad gateway").kind(),
            ErrorKind::ServerError
        );
        assert_eq!(
            ProcessingError::from_status(401, "unauthorized").kind(),
            ErrorKind::ClientError
        );
        assert_eq!(
            ProcessingError::from_status(400, "bad request").kind(),
            ErrorKind::ClientError
        );
    }

    #[test]
    fn test_status_code_carried() {
        let err = ProcessingError::from_status(503, "");
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("no response body"));

        let err = ProcessingError::Network {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_messages_name_the_cause() {
        let rate = ProcessingError::from_status(429, "too many requests");
        assert!(rate.to_string().contains("Rate limited"));

        let server = ProcessingError::from_status(500, "boom");
        assert!(server.to_string().contains("OpenRouter/extraction API error"));
    }

    #[test]
    fn test_missing_field_is_parse_kind() {
        let err = ProcessingError::MissingField {
            field: "reading",
            message: "No odometer reading found in image".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.to_string(), "No odometer reading found in image");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::InvalidInput.to_string(), "invalid_input");
        assert_eq!(ErrorKind::RateLimited.to_string(), "rate_limited");
        assert_eq!(
            serde_json::to_string(&ErrorKind::ServerError).unwrap(),
            "\"server_error\""
        );
    }
}
