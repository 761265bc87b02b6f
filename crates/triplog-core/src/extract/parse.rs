//! Conversion of free-form model replies into typed extraction results.
//!
//! Models wrap their JSON in prose or markdown fences often enough that we
//! locate the outermost object first, then validate fields by hand so that a
//! missing odometer reading is reported differently from malformed output.

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{ExtractedOdometerReading, ExtractedReceipt, Location};
use serde_json::{Map, Value};

const RECEIPT_PARSE_FAILURE: &str = "Failed to parse receipt data";
const ODOMETER_PARSE_FAILURE: &str = "Failed to parse odometer data";
const NO_ODOMETER_READING: &str = "No odometer reading found in image";

/// Return the slice spanning the first `{` to the last `}` in `text`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_object(text: &str, failure: &str) -> ProcessingResult<Map<String, Value>> {
    let candidate = extract_json_object(text).ok_or_else(|| ProcessingError::Parse {
        message: format!("{failure}: no JSON object in model response"),
    })?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProcessingError::Parse {
            message: format!("{failure}: response is not a JSON object"),
        }),
        Err(e) => Err(ProcessingError::Parse {
            message: format!("{failure}: {e}"),
        }),
    }
}

fn numeric_str(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Read a number that the model may have rendered as a string like "1,234.50".
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_str(s),
        _ => None,
    }
}

/// Like `lenient_number`, but also tolerates currency decoration such as
/// "$45.00" or "45.00 EUR".
fn lenient_amount(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => numeric_str(
            s.trim_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.')),
        ),
        other => lenient_number(other),
    }
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn required_confidence(map: &Map<String, Value>, failure: &str) -> ProcessingResult<f64> {
    map.get("confidence")
        .and_then(lenient_number)
        .ok_or_else(|| ProcessingError::Parse {
            message: format!("{failure}: missing or non-numeric confidence"),
        })
}

/// Parse a receipt reply. Every field except `confidence` is optional.
pub fn parse_receipt(text: &str) -> ProcessingResult<ExtractedReceipt> {
    let map = parse_object(text, RECEIPT_PARSE_FAILURE)?;
    let confidence = required_confidence(&map, RECEIPT_PARSE_FAILURE)?;

    // An unreadable amount is dropped rather than failing the whole receipt.
    let amount = match map.get("amount") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let amount = lenient_amount(value);
            if amount.is_none() {
                tracing::debug!("Ignoring non-numeric receipt amount: {value}");
            }
            amount
        }
    };

    let location = match map.get("location") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(Location::Text(s.trim().to_string())),
        Some(Value::Object(obj)) => Some(Location::Structured(obj.clone())),
        _ => None,
    };

    Ok(ExtractedReceipt {
        vendor: optional_string(&map, "vendor"),
        amount,
        currency: optional_string(&map, "currency"),
        date: optional_string(&map, "date"),
        location,
        expense_type: optional_string(&map, "expenseType"),
        description: optional_string(&map, "description"),
        confidence,
    })
}

/// Parse an odometer reply. `reading` is required; commas are stripped from
/// string readings before conversion.
pub fn parse_odometer(text: &str) -> ProcessingResult<ExtractedOdometerReading> {
    let map = parse_object(text, ODOMETER_PARSE_FAILURE)?;

    let reading = match map.get("reading") {
        None | Some(Value::Null) => {
            return Err(ProcessingError::MissingField {
                field: "reading",
                message: NO_ODOMETER_READING.to_string(),
            });
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(ProcessingError::MissingField {
                field: "reading",
                message: NO_ODOMETER_READING.to_string(),
            });
        }
        Some(value) => lenient_number(value).ok_or_else(|| ProcessingError::Parse {
            message: format!("{ODOMETER_PARSE_FAILURE}: reading {value} is not numeric"),
        })?,
    };

    let confidence = required_confidence(&map, ODOMETER_PARSE_FAILURE)?;

    Ok(ExtractedOdometerReading {
        reading,
        date: optional_string(&map, "date"),
        confidence,
    })
}
