/*!
 * Tests for error types and conversions
 */

use sheetloc::errors::{AppError, AuditError, PipelineError, ProviderError, StoreError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "overloaded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("503"));
    assert!(display.contains("overloaded"));
}

#[test]
fn test_providerError_isTransient_shouldClassifyRetryableErrors() {
    assert!(ProviderError::ConnectionError("reset".into()).is_transient());
    assert!(ProviderError::RequestFailed("timeout".into()).is_transient());
    assert!(ProviderError::ApiError { status_code: 500, message: String::new() }.is_transient());
    assert!(ProviderError::ApiError { status_code: 429, message: String::new() }.is_transient());
    assert!(ProviderError::RateLimitExceeded { message: String::new(), retry_after_secs: None }.is_transient());

    assert!(!ProviderError::ParseError("not json".into()).is_transient());
    assert!(!ProviderError::AuthenticationError("bad key".into()).is_transient());
    assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }.is_transient());
    assert!(!ProviderError::RetriesExhausted { attempts: 5, last_error: String::new() }.is_transient());
}

#[test]
fn test_providerError_isRateLimit_shouldIncludeHttp429() {
    assert!(ProviderError::ApiError { status_code: 429, message: String::new() }.is_rate_limit());
    assert!(ProviderError::RateLimitExceeded { message: String::new(), retry_after_secs: Some(30) }.is_rate_limit());
    assert!(!ProviderError::ApiError { status_code: 503, message: String::new() }.is_rate_limit());
}

#[test]
fn test_providerError_retriesExhausted_shouldReportAttempts() {
    let error = ProviderError::RetriesExhausted {
        attempts: 5,
        last_error: "Connection error: reset".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains("5 attempts"));
    assert!(display.contains("Connection error: reset"));
}

#[test]
fn test_storeError_missingColumn_shouldNameSheetAndColumn() {
    let error = StoreError::MissingColumn {
        sheet: "UI".to_string(),
        column: "English".to_string(),
    };
    assert_eq!(error.to_string(), "Missing column 'English' in sheet 'UI'");
}

#[test]
fn test_pipelineError_fromStoreError_shouldWrap() {
    let error: PipelineError = StoreError::SheetNotFound("MATCH".into()).into();
    assert!(matches!(error, PipelineError::Store(StoreError::SheetNotFound(_))));
    assert!(error.to_string().contains("MATCH"));
}

#[test]
fn test_appError_conversions_shouldPreserveMessages() {
    let app_error: AppError = ProviderError::AuthenticationError("bad key".into()).into();
    assert!(app_error.to_string().contains("bad key"));

    let app_error: AppError = PipelineError::NoValidSheets("UI, MATCH".into()).into();
    assert!(app_error.to_string().contains("UI, MATCH"));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "conf.json");
    let app_error: AppError = io.into();
    assert!(matches!(app_error, AppError::File(_)));
}

#[test]
fn test_auditError_unknownStatus_shouldShowValue() {
    let error = AuditError::UnknownStatus("DONE".into());
    assert_eq!(error.to_string(), "Unknown audit status: DONE");
}
