//! OpenAI extraction backend using the Chat Completions API.
//!
//! Sends the image via data URL in the user message content array and maps
//! HTTP outcomes onto `ProcessingError` variants for the retry loop.

use super::backend::{ExtractionBackend, ExtractionReply, ExtractionRequest};
use crate::error::ProcessingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Append the Chat Completions path to an API base URL.
pub fn chat_completions_url(base: &str) -> String {
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

/// OpenAI backend using the Chat Completions API.
pub struct OpenAiBackend {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    extra_headers: Vec<(String, String)>,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_endpoint(
            api_key,
            model,
            "https://api.openai.com/v1/chat/completions",
        )
    }

    /// Create with a custom endpoint (used by the OpenRouter backend).
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            extra_headers: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Send an additional header with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{head}...")
    }
}

#[async_trait]
impl ExtractionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionReply, ProcessingError> {
        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::Text {
                        text: request.prompt.clone(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                        },
                    },
                ],
            }],
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        for (name, value) in &self.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProcessingError::Network {
                message: format!("request to {} failed: {e}", self.endpoint),
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProcessingError::Network {
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(ProcessingError::from_status(
                status.as_u16(),
                &truncate_body(&text),
            ));
        }

        let chat_resp: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ProcessingError::Parse {
                message: format!("Failed to parse extraction API response: {e}"),
            })?;

        let content = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProcessingError::Parse {
                message: "Extraction API returned no content in choices[0].message.content"
                    .to_string(),
            })?;

        Ok(ExtractionReply {
            content: content.trim().to_string(),
            model: chat_resp.model.unwrap_or_else(|| self.model.clone()),
            tokens_used: chat_resp.usage.map(|u| u.total_tokens),
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completions_url() {
        assert_eq!(
            chat_completions_url("https://openrouter.ai/api/v1/"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://localhost:8080"),
            "http://localhost:8080/chat/completions"
        );
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), MAX_ERROR_BODY_CHARS + 3);
    }

    #[test]
    fn test_request_serializes_image_and_prompt() {
        let body = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 100,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::Text {
                        text: "read this".to_string(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/jpeg;base64,AAAA".to_string(),
                        },
                    },
                ],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
    }
}
