//! Core data types produced by extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Structured data pulled from a receipt photo.
///
/// Only `confidence` is guaranteed. Absent fields stay `None` so the caller
/// decides its own fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// ISO 4217 code or symbol as returned by the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Category such as "meals", "lodging", "fuel"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Model's self-reported confidence (0.0 - 1.0)
    pub confidence: f64,
}

/// Where a receipt was issued: either free text or whatever structure the
/// model returned (address parts, coordinates, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Text(String),
    Structured(serde_json::Map<String, serde_json::Value>),
}

/// Odometer value read from a dashboard photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedOdometerReading {
    pub reading: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    pub confidence: f64,
}

/// Which kind of document an image holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Receipt,
    Odometer,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Receipt => write!(f, "receipt"),
            DocumentKind::Odometer => write!(f, "odometer"),
        }
    }
}

/// Result of one successful extraction, tagged by document kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Extraction {
    Receipt(ExtractedReceipt),
    Odometer(ExtractedOdometerReading),
}

impl Extraction {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Extraction::Receipt(_) => DocumentKind::Receipt,
            Extraction::Odometer(_) => DocumentKind::Odometer,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Extraction::Receipt(r) => r.confidence,
            Extraction::Odometer(o) => o.confidence,
        }
    }
}

/// One line of extraction output for a file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    pub file_path: PathBuf,

    pub file_name: String,

    #[serde(flatten)]
    pub extraction: Extraction,

    /// Model identifier reported by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Wall-clock time for the whole call, retries included
    pub latency_ms: u64,

    /// Number of backend requests made
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_omits_absent_fields() {
        let receipt = ExtractedReceipt {
            vendor: Some("Cafe Nero".to_string()),
            amount: None,
            currency: None,
            date: None,
            location: None,
            expense_type: Some("meals".to_string()),
            description: None,
            confidence: 0.9,
        };
        let json = serde_json::to_string(&receipt).unwrap();
        assert!(json.contains("\"vendor\":\"Cafe Nero\""));
        assert!(json.contains("\"expenseType\":\"meals\""));
        assert!(!json.contains("amount"));
        assert!(!json.contains("location"));
    }

    #[test]
    fn test_location_accepts_text_or_object() {
        let text: Location = serde_json::from_str("\"Berlin, DE\"").unwrap();
        assert_eq!(text, Location::Text("Berlin, DE".to_string()));

        let structured: Location =
            serde_json::from_str(r#"{"city": "Berlin", "country": "DE"}"#).unwrap();
        match structured {
            Location::Structured(map) => assert_eq!(map["city"], "Berlin"),
            Location::Text(_) => panic!("Expected structured location"),
        }
    }

    #[test]
    fn test_extraction_record_flattens_kind() {
        let record = ExtractionRecord {
            file_path: PathBuf::from("/trips/odo.jpg"),
            file_name: "odo.jpg".to_string(),
            extraction: Extraction::Odometer(ExtractedOdometerReading {
                reading: 12345.6,
                date: None,
                confidence: 0.8,
            }),
            model: Some("openai/gpt-4o-mini".to_string()),
            latency_ms: 120,
            attempts: 1,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], "odometer");
        assert_eq!(value["reading"], 12345.6);
        assert_eq!(value["file_name"], "odo.jpg");
    }

    #[test]
    fn test_document_kind_display() {
        assert_eq!(DocumentKind::Receipt.to_string(), "receipt");
        assert_eq!(DocumentKind::Odometer.to_string(), "odometer");
    }
}
