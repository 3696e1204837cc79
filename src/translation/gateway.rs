/*!
 * Provider gateway.
 *
 * Turns a batch of protected segments into one provider request and turns the
 * provider's answer back into a `key -> text` mapping. Transient failures are
 * retried here with exponential backoff; rate limits wait longer, honouring any
 * delay the provider suggested. Unparsable answers are never retried.
 */

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Extra delay added on top of a provider-suggested retry-after hint
const RETRY_AFTER_MARGIN: Duration = Duration::from_secs(5);

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```(?:json|JSON)?\s*\n?(.*?)\n?\s*```\s*$").expect("Invalid code fence regex")
});

/// One segment as sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPayload {
    /// Segment key, echoed back in the response
    pub key: String,
    /// Sheet name, for context only
    pub sheet: String,
    /// Source text with markup replaced by tokens
    #[serde(rename = "source")]
    pub protected_source: String,
    /// Optional translator hint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

/// A batch request: shared instructions plus the protected segments
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub instructions: String,
    pub segments: Vec<SegmentPayload>,
}

#[derive(Serialize)]
struct UserContent<'a> {
    segments: &'a [SegmentPayload],
}

impl BatchRequest {
    /// Create a request
    pub fn new(instructions: impl Into<String>, segments: Vec<SegmentPayload>) -> Self {
        Self {
            instructions: instructions.into(),
            segments,
        }
    }

    /// JSON user payload: `{"segments": [...]}`
    pub fn user_content(&self) -> String {
        serde_json::to_string(&UserContent {
            segments: &self.segments,
        })
        .unwrap_or_else(|_| r#"{"segments":[]}"#.to_string())
    }

    /// Number of segments in the request
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the request carries no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Capability to translate one batch
///
/// Implementations own their retry policy. An `Err` means the whole batch
/// produced nothing usable.
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    /// Translate a batch, returning translated text by segment key
    async fn translate_batch(
        &self,
        request: &BatchRequest,
    ) -> Result<HashMap<String, String>, ProviderError>;
}

/// Retry settings for the provider gateway
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base delay for exponential backoff on transient errors
    pub backoff_base: Duration,
    /// Base delay after a rate-limit error, multiplied by the attempt number
    pub rate_limit_wait: Duration,
    /// Upper bound for any single retry delay, including provider hints
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(1000),
            rate_limit_wait: Duration::from_millis(25000),
            max_wait: Duration::from_millis(300000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt after `error` on attempt number `attempt` (1-based)
    pub fn delay_for(&self, error: &ProviderError, attempt: u32) -> Duration {
        let delay = if error.is_rate_limit() {
            let scaled = self.rate_limit_wait.saturating_mul(attempt);
            let hinted = match error {
                ProviderError::RateLimitExceeded {
                    retry_after_secs: Some(secs),
                    ..
                } => Duration::from_secs(*secs).saturating_add(RETRY_AFTER_MARGIN),
                _ => Duration::ZERO,
            };
            scaled.max(hinted)
        } else {
            let shift = attempt.saturating_sub(1).min(16);
            self.backoff_base.saturating_mul(1u32 << shift)
        };
        delay.min(self.max_wait)
    }
}

/// Gateway backed by a concrete LLM provider
#[derive(Debug)]
pub struct ProviderGateway {
    provider: Box<dyn Provider>,
    policy: RetryPolicy,
}

impl ProviderGateway {
    /// Wrap a provider with a retry policy
    pub fn new(provider: Box<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }
}

#[async_trait]
impl TranslationGateway for ProviderGateway {
    async fn translate_batch(
        &self,
        request: &BatchRequest,
    ) -> Result<HashMap<String, String>, ProviderError> {
        let content = request.user_content();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "[Gateway] {} request with {} segments (attempt {}/{})",
                self.provider.name(),
                request.len(),
                attempt,
                max_attempts
            );

            match self.provider.complete(&request.instructions, &content).await {
                Ok(raw) => return parse_translations(&raw),
                Err(e) if !e.is_transient() => {
                    warn!("[Gateway] {} failed with non-retryable error: {}", self.provider.name(), e);
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        return Err(ProviderError::RetriesExhausted {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }
                    let delay = self.policy.delay_for(&e, attempt);
                    warn!(
                        "[Gateway] {} (attempt {}/{}), retrying in {:.1}s",
                        e,
                        attempt,
                        max_attempts,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Strip a surrounding Markdown code fence, if any
fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

/// Parse a `{"translations": [{"key", "text"}, ...]}` response
///
/// Items that are not objects or carry no key are skipped. A missing or
/// null `text` reads as an empty string.
pub fn parse_translations(raw: &str) -> Result<HashMap<String, String>, ProviderError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::ParseError(format!("response is not valid JSON: {}", e)))?;

    let items = value
        .get("translations")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ProviderError::ParseError("response has no 'translations' array".to_string())
        })?;

    let mut translations = HashMap::with_capacity(items.len());
    for item in items {
        let Some(object) = item.as_object() else {
            continue;
        };
        let key = match object.get("key") {
            Some(Value::String(key)) => key.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        if key.is_empty() {
            continue;
        }
        let text = match object.get("text") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };
        translations.insert(key, text);
    }

    Ok(translations)
}
