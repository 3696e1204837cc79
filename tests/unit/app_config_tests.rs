/*!
 * Tests for application configuration functionality
 */

use std::str::FromStr;

use sheetloc::app_config::{Config, LogLevel, MAX_BATCH_SIZE, ProviderConfig, TranslationProvider};

use crate::common;

/// Default config with an inline API key so validation never depends on the environment
fn valid_config() -> Config {
    let mut config = Config::default();
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config
}

#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "English");
    assert_eq!(config.target_language, "French");
    assert_eq!(config.batch_size, 50);
    assert_eq!(config.batch_cooldown_ms, 22000);
    assert_eq!(config.max_consecutive_batch_failures, None);
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);
    assert_eq!(config.translation.common.max_retries, 5);
    assert_eq!(config.translation.common.retry_backoff_ms, 1000);
    assert_eq!(config.translation.common.rate_limit_wait_ms, 25000);
    assert_eq!(config.translation.common.max_retry_wait_ms, 300000);
    assert_eq!(config.store.keys_column, "Keys");
    assert_eq!(config.store.comment_column, "$comment");
    assert_eq!(config.store.donottranslate_column, "$donottranslate");
    assert_eq!(config.log_level, LogLevel::Info);

    let gemini = config
        .translation
        .get_provider_config(&TranslationProvider::Gemini)
        .expect("Gemini provider config should exist");
    assert_eq!(gemini.model, "gemini-2.5-flash-lite");
    assert_eq!(gemini.timeout_secs, 120);
}

#[test]
fn test_effectiveTargetColumn_shouldFallBackToTargetLanguage() {
    let mut config = Config::default();
    assert_eq!(config.effective_target_column(), "French");

    config.target_column = "Français".to_string();
    assert_eq!(config.effective_target_column(), "Français");
}

#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = valid_config();
    assert!(config.validate().is_ok());

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "French".to_string();

    config.sheets = vec![" ".to_string()];
    assert!(config.validate().is_err());
    config.sheets = vec!["UI".to_string()];

    config.batch_size = 0;
    assert!(config.validate().is_err());
    config.batch_size = MAX_BATCH_SIZE + 1;
    assert!(config.validate().is_err());
    config.batch_size = MAX_BATCH_SIZE;
    assert!(config.validate().is_ok());

    config.translation.common.max_retries = 0;
    assert!(config.validate().is_err());
    config.translation.common.max_retries = 1;

    config.translation.common.temperature = 2.5;
    assert!(config.validate().is_err());
    config.translation.common.temperature = 0.2;

    config.translation.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withoutApiKey_shouldNameEnvironmentVariable() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.active_provider_config_mut().api_key = String::new();

    // Only meaningful when the variable is not set in the test environment
    if std::env::var("OPENAI_API_KEY").is_err() {
        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("OPENAI_API_KEY"));
    }
}

#[test]
fn test_providerFromStr_shouldAcceptKnownNamesOnly() {
    assert_eq!(TranslationProvider::from_str("gemini").unwrap(), TranslationProvider::Gemini);
    assert_eq!(TranslationProvider::from_str("OpenAI").unwrap(), TranslationProvider::OpenAI);
    assert!(TranslationProvider::from_str("anthropic").is_err());
    assert_eq!(TranslationProvider::OpenAI.to_string(), "openai");
}

#[test]
fn test_activeProviderConfigMut_withMissingEntry_shouldCreateDefaults() {
    let mut config = Config::default();
    config.translation.available_providers.clear();
    config.translation.provider = TranslationProvider::OpenAI;

    config.translation.active_provider_config_mut().model = "gpt-4o".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "gpt-4o");
    assert_eq!(config.translation.get_endpoint(), "https://api.openai.com/v1");
}

#[test]
fn test_getters_withEmptyProviderFields_shouldUseDefaults() {
    let mut config = Config::default();
    config.translation.available_providers = vec![ProviderConfig {
        provider_type: "gemini".to_string(),
        model: String::new(),
        api_key: String::new(),
        endpoint: String::new(),
        timeout_secs: 0,
    }];

    assert_eq!(config.translation.get_model(), "gemini-2.5-flash-lite");
    assert!(config.translation.get_endpoint().starts_with("https://generativelanguage.googleapis.com"));
    assert_eq!(config.translation.get_timeout_secs(), 120);
}

#[test]
fn test_fromFile_withMinimalJson_shouldApplyDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "target_language": "Portuguese_BR",
            "target_column": "Portuguese",
            "sheets": ["UI", "MATCH"],
            "translation": {
                "provider": "openai",
                "available_providers": [{ "type": "openai", "model": "gpt-4o", "api_key": "k" }]
            }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.source_language, "English");
    assert_eq!(config.sheets, vec!["UI", "MATCH"]);
    assert_eq!(config.effective_target_column(), "Portuguese");
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.get_model(), "gpt-4o");
    assert_eq!(config.translation.get_api_key(), "k");
    assert_eq!(config.batch_size, 50);
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefault() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.exists());

    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.target_language, created.target_language);
    assert_eq!(reloaded.sheets, created.sheets);
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::from_file(&path).is_err());
}
