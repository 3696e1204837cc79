use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, classify_send_error, classify_status, retry_after_header};

/// OpenAI client for the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Forces the model to answer with a JSON object
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Requested output format
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Candidate completions
    pub choices: Vec<OpenAIChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,
}

impl OpenAIRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            response_format: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask for a JSON object answer
    pub fn json_mode(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            format_type: "json_object".to_string(),
        });
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
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
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Send a chat completions request
    pub async fn send(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_send_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(classify_status(status, retry_after, error_text));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("OpenAI response body: {}", e)))
    }

    /// Extract text from the first choice
    pub fn extract_text(response: &OpenAIResponse) -> Option<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
    }
}

#[async_trait]
impl Provider for OpenAI {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, instructions: &str, content: &str) -> Result<String, ProviderError> {
        debug!("[OpenAI] Calling {}", self.model);

        let request = OpenAIRequest::new(&self.model)
            .add_message("system", instructions)
            .add_message("user", content)
            .temperature(self.temperature)
            .json_mode();

        let response = self.send(&request).await?;
        Self::extract_text(&response)
            .ok_or_else(|| ProviderError::ParseError("OpenAI returned no message content".to_string()))
    }
}
