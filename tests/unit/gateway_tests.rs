/*!
 * Tests for the provider gateway: request shape, retry timing and failure classes
 */

use std::time::Duration;

use sheetloc::errors::ProviderError;
use sheetloc::providers::mock::MockProvider;
use sheetloc::translation::{BatchRequest, ProviderGateway, RetryPolicy, SegmentPayload, TranslationGateway};

fn request(keys: &[&str]) -> BatchRequest {
    BatchRequest::new(
        "instructions",
        keys.iter()
            .map(|key| SegmentPayload {
                key: key.to_string(),
                sheet: "UI".to_string(),
                protected_source: format!("Text for {}", key),
                comment: String::new(),
            })
            .collect(),
    )
}

#[test]
fn test_userContent_withComment_shouldIncludeIt() {
    let request = BatchRequest::new(
        "x",
        vec![SegmentPayload {
            key: "CELEB_M".to_string(),
            sheet: "MATCH".to_string(),
            protected_source: "__VAR0__ celebrates".to_string(),
            comment: "male player".to_string(),
        }],
    );

    let value: serde_json::Value = serde_json::from_str(&request.user_content()).unwrap();
    let segment = &value["segments"][0];
    assert_eq!(segment["key"], "CELEB_M");
    assert_eq!(segment["sheet"], "MATCH");
    assert_eq!(segment["source"], "__VAR0__ celebrates");
    assert_eq!(segment["comment"], "male player");
    assert_eq!(request.len(), 1);
}

#[test]
fn test_retryPolicy_default_shouldMatchDocumentedValues() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.backoff_base, Duration::from_secs(1));
    assert_eq!(policy.rate_limit_wait, Duration::from_secs(25));
    assert_eq!(policy.max_wait, Duration::from_secs(300));

    let rate_limited = ProviderError::ApiError {
        status_code: 429,
        message: String::new(),
    };
    assert_eq!(policy.delay_for(&rate_limited, 2), Duration::from_secs(50));
    assert_eq!(
        policy.delay_for(&ProviderError::ConnectionError(String::new()), 4),
        Duration::from_secs(8)
    );
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withEchoProvider_shouldReturnEveryKey() {
    let provider = MockProvider::working();
    let gateway = ProviderGateway::new(Box::new(provider.clone()), RetryPolicy::default());

    let result = gateway.translate_batch(&request(&["A", "B", "C"])).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result["B"], "[TRANSLATED] Text for B");
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withRetryAfterHint_shouldWaitHintPlusMargin() {
    let provider = MockProvider::rate_limited(1, Some(60));
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff_base: Duration::from_millis(10),
        rate_limit_wait: Duration::from_secs(25),
        max_wait: Duration::from_secs(300),
    };
    let gateway = ProviderGateway::new(Box::new(provider.clone()), policy);

    let start = tokio::time::Instant::now();
    gateway.translate_batch(&request(&["A"])).await.unwrap();

    assert_eq!(provider.request_count(), 2);
    assert!(start.elapsed() >= Duration::from_secs(65));
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withEveryRequestFailing_shouldExhaustRetries() {
    let provider = MockProvider::intermittent(1);
    let policy = RetryPolicy {
        max_attempts: 2,
        backoff_base: Duration::from_millis(10),
        rate_limit_wait: Duration::from_millis(10),
        max_wait: Duration::from_secs(1),
    };
    let gateway = ProviderGateway::new(Box::new(provider.clone()), policy);

    let error = gateway.translate_batch(&request(&["A"])).await.unwrap_err();

    assert!(matches!(error, ProviderError::RetriesExhausted { attempts: 2, .. }));
    assert!(error.to_string().contains("503"));
}

#[tokio::test]
async fn test_translateBatch_withEmptyTranslations_shouldReturnEmptyMap() {
    let provider = MockProvider::empty();
    let gateway = ProviderGateway::new(Box::new(provider), RetryPolicy::default());

    let result = gateway.translate_batch(&request(&["A"])).await.unwrap();

    assert!(result.is_empty());
}
