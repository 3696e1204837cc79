/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Echoes every segment back as a translation
 * - `MockProvider::intermittent(n)` - Fails every Nth request
 * - `MockProvider::failing()` - Always fails with a server error
 * - `MockProvider::rate_limited(n)` - Rate-limits the first N requests, then works
 * - `MockProvider::malformed()` - Returns text that is not JSON
 */

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds, prefixing each protected source with `[TRANSLATED] `
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a 500 error
    Failing,
    /// Rate-limits the first `times` requests, then behaves like `Working`
    RateLimited {
        times: usize,
        retry_after_secs: Option<u64>,
    },
    /// Rejects the credentials
    Unauthorized,
    /// Returns a body that is not JSON
    Malformed,
    /// Returns a well-formed response with no translations
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator, called with the user payload (optional)
    custom_response: Option<fn(&str) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that rate-limits the first `times` requests
    pub fn rate_limited(times: usize, retry_after_secs: Option<u64>) -> Self {
        Self::new(MockBehavior::RateLimited {
            times,
            retry_after_secs,
        })
    }

    /// Create a mock that rejects its credentials
    pub fn unauthorized() -> Self {
        Self::new(MockBehavior::Unauthorized)
    }

    /// Create a mock that returns unparsable bodies
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that returns an empty translation list
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Build a translations response that echoes every segment of `content`
    pub fn echo_response(content: &str) -> String {
        let payload: Value = serde_json::from_str(content).unwrap_or(Value::Null);
        let translations: Vec<Value> = payload
            .get("segments")
            .and_then(Value::as_array)
            .map(|segments| {
                segments
                    .iter()
                    .map(|segment| {
                        let key = segment.get("key").and_then(Value::as_str).unwrap_or_default();
                        let source = segment.get("source").and_then(Value::as_str).unwrap_or_default();
                        json!({ "key": key, "text": format!("[TRANSLATED] {}", source) })
                    })
                    .collect()
            })
            .unwrap_or_default();

        json!({ "translations": translations }).to_string()
    }

    fn working_response(&self, content: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(content),
            None => Self::echo_response(content),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn complete(&self, _instructions: &str, content: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(self.working_response(content)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.working_response(content))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::RateLimited {
                times,
                retry_after_secs,
            } => {
                if count < times {
                    Err(ProviderError::RateLimitExceeded {
                        message: "Simulated quota exhaustion".to_string(),
                        retry_after_secs,
                    })
                } else {
                    Ok(self.working_response(content))
                }
            }

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError(
                "Simulated invalid API key".to_string(),
            )),

            MockBehavior::Malformed => Ok("Sorry, I cannot help with that.".to_string()),

            MockBehavior::Empty => Ok(r#"{"translations":[]}"#.to_string()),
        }
    }
}
