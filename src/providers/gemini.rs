use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, classify_send_error, classify_status, retry_after_header};

/// Gemini client for the `generateContent` API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    endpoint: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Instructions applied to the whole exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    /// Conversation turns
    contents: Vec<GeminiContent>,
    /// Sampling configuration
    generation_config: GenerationConfig,
}

/// One conversation turn
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Text part of a turn
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// Sampling configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    temperature: f32,
    candidate_count: u32,
    response_mime_type: String,
}

/// `generateContent` response body
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One response candidate
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

impl GeminiRequest {
    /// Build a single-turn JSON-mode request
    pub fn new(instructions: &str, content: &str, temperature: f32) -> Self {
        Self {
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: instructions.to_string(),
                }],
            }),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: content.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                candidate_count: 1,
                response_mime_type: "application/json".to_string(),
            },
        }
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature,
        }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://generativelanguage.googleapis.com/v1beta"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/models/{}:generateContent", base, self.model)
    }

    /// Send a `generateContent` request
    pub async fn send(&self, request: &GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_send_error("Gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(classify_status(status, retry_after, error_text));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Gemini response body: {}", e)))
    }

    /// Concatenate the text parts of the first candidate
    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        Some(content.parts.iter().map(|part| part.text.as_str()).collect())
    }
}

#[async_trait]
impl Provider for Gemini {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn complete(&self, instructions: &str, content: &str) -> Result<String, ProviderError> {
        debug!("[Gemini] Calling {}", self.model);

        let request = GeminiRequest::new(instructions, content, self.temperature);
        let response = self.send(&request).await?;
        Self::extract_text(&response)
            .ok_or_else(|| ProviderError::ParseError("Gemini returned no candidates".to_string()))
    }
}
