/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - OpenAI: Chat completions API in JSON mode
 * - Gemini: Google Generative Language API
 * - Mock: Scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// A provider performs exactly one network round-trip per call. Retries,
/// backoff and response parsing belong to the gateway that wraps it.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short human-readable name used in log lines
    fn name(&self) -> &str;

    /// Send instructions plus a user payload and return the raw response text
    ///
    /// # Arguments
    /// * `instructions` - System-level instructions
    /// * `content` - JSON payload describing the segments to translate
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The model's text output or a classified error
    async fn complete(&self, instructions: &str, content: &str) -> Result<String, ProviderError>;
}

/// Map a failed HTTP send into a provider error
pub(crate) fn classify_send_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, error))
    }
}

/// Map a non-success HTTP status into a provider error
pub(crate) fn classify_status(
    status: reqwest::StatusCode,
    retry_after_header: Option<u64>,
    body: String,
) -> ProviderError {
    let rate_limited = status.as_u16() == 429
        || body.contains("RESOURCE_EXHAUSTED")
        || body.contains("rate_limit_exceeded");

    if rate_limited {
        let retry_after_secs = retry_after_header.or_else(|| retry_after_from_message(&body));
        return ProviderError::RateLimitExceeded {
            message: body,
            retry_after_secs,
        };
    }

    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Parse a "try again in 20s" style hint out of an error message
pub(crate) fn retry_after_from_message(message: &str) -> Option<u64> {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static RETRY_HINT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)try again in (\d+)(?:\.\d+)?\s*s").expect("Invalid retry hint regex")
    });

    RETRY_HINT
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Read a `Retry-After` header expressed in seconds
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

pub mod gemini;
pub mod mock;
pub mod openai;
