//! Image payloads accepted by the extraction client.

use crate::error::{ProcessingError, ProcessingResult};
use base64::Engine;
use std::path::Path;

/// Base64-encoded image ready to send to an extraction API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and a format or extension string.
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type_for(format).to_string(),
        }
    }

    /// Read and encode an image file, rejecting files over `max_bytes`.
    pub async fn from_path(path: &Path, max_bytes: u64) -> ProcessingResult<Self> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            ProcessingError::InvalidInput(format!("Failed to read image {}: {e}", path.display()))
        })?;
        if meta.len() == 0 {
            return Err(ProcessingError::InvalidInput(format!(
                "Image file is empty: {}",
                path.display()
            )));
        }
        if meta.len() > max_bytes {
            return Err(ProcessingError::InvalidInput(format!(
                "Image file too large: {} ({} bytes > {} bytes)",
                path.display(),
                meta.len(),
                max_bytes
            )));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ProcessingError::InvalidInput(format!("Failed to read image {}: {e}", path.display()))
        })?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpeg")
            .to_lowercase();
        Ok(Self::from_bytes(&bytes, &format))
    }

    /// Accept a caller-supplied image string: a `data:` URL or bare base64.
    ///
    /// Bare base64 is assumed to be JPEG. Empty input is rejected before any
    /// request is built.
    pub fn parse(image: &str) -> ProcessingResult<Self> {
        let image = image.trim();
        if image.is_empty() {
            return Err(ProcessingError::InvalidInput(
                "No image provided".to_string(),
            ));
        }

        if let Some(rest) = image.strip_prefix("data:") {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                ProcessingError::InvalidInput("Malformed data URL: missing ',' separator".into())
            })?;
            if data.trim().is_empty() {
                return Err(ProcessingError::InvalidInput(
                    "Data URL contains no image data".to_string(),
                ));
            }
            let media_type = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .unwrap_or("image/jpeg");
            return Ok(Self {
                data: data.trim().to_string(),
                media_type: media_type.to_string(),
            });
        }

        Ok(Self {
            data: image.to_string(),
            media_type: "image/jpeg".to_string(),
        })
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

fn media_type_for(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        other => {
            tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}
