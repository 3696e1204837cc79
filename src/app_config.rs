use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language name, also the header of the source column
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language name, recorded in the audit log
    pub target_language: String,

    /// Header of the column receiving translations (defaults to the target language)
    #[serde(default)]
    pub target_column: String,

    /// Sheets to process, in order
    #[serde(default)]
    pub sheets: Vec<String>,

    /// Segments per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Cooldown between two batches of the same sheet, in milliseconds
    #[serde(default = "default_batch_cooldown_ms")]
    pub batch_cooldown_ms: u64,

    /// Abandon the rest of a sheet pass after this many failed batches in a row
    #[serde(default)]
    pub max_consecutive_batch_failures: Option<u32>,

    /// Translation config
    pub translation: TranslationConfig,

    /// Tabular store config
    #[serde(default)]
    pub store: StoreConfig,

    /// Directory for audit and run logs
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: OpenAI
    OpenAI,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
        }
    }

    // @returns: Environment variable holding the fallback API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key (falls back to the provider's environment variable)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Gemini => Self {
                provider_type: "gemini".to_string(),
                model: default_gemini_model(),
                api_key: String::new(),
                endpoint: default_gemini_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Total attempts per batch, including the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base for transient errors (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Wait after a rate-limit error (in milliseconds), multiplied by the attempt number
    #[serde(default = "default_rate_limit_wait_ms")]
    pub rate_limit_wait_ms: u64,

    /// Longest single wait between retries (in milliseconds), caps provider retry-after hints
    #[serde(default = "default_max_retry_wait_ms")]
    pub max_retry_wait_ms: u64,

    /// Temperature parameter for text generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// File replacing the built-in instruction template
    /// Placeholders: {source_language}, {target_language}
    #[serde(default)]
    pub instructions_file: Option<String>,

    /// Text appended to the instructions
    #[serde(default)]
    pub extra_instructions: Option<String>,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rate_limit_wait_ms: default_rate_limit_wait_ms(),
            max_retry_wait_ms: default_max_retry_wait_ms(),
            temperature: default_temperature(),
            instructions_file: None,
            extra_instructions: None,
        }
    }
}

/// Tabular store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Workbook directory (one `<sheet>.csv` per sheet)
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Header of the unique key column
    #[serde(default = "default_keys_column")]
    pub keys_column: String,

    /// Header of the optional comment column
    #[serde(default = "default_comment_column")]
    pub comment_column: String,

    /// Header of the optional do-not-translate flag column
    #[serde(default = "default_donottranslate_column")]
    pub donottranslate_column: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            keys_column: default_keys_column(),
            comment_column: default_comment_column(),
            donottranslate_column: default_donottranslate_column(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Largest accepted batch size
pub const MAX_BATCH_SIZE: usize = 100;

fn default_source_language() -> String {
    "English".to_string()
}

fn default_batch_size() -> usize {
    50
}

fn default_batch_cooldown_ms() -> u64 {
    22000
}

fn default_logs_dir() -> String {
    "logs".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_rate_limit_wait_ms() -> u64 {
    25000
}

fn default_max_retry_wait_ms() -> u64 {
    300000 // 5 minutes
}

fn default_temperature() -> f32 {
    0.2
}

fn default_store_path() -> String {
    "localization".to_string()
}

fn default_keys_column() -> String {
    "Keys".to_string()
}

fn default_comment_column() -> String {
    "$comment".to_string()
}

fn default_donottranslate_column() -> String {
    "$donottranslate".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load a configuration file, writing a default one first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Self::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Column that receives translations
    pub fn effective_target_column(&self) -> &str {
        if self.target_column.trim().is_empty() {
            &self.target_language
        } else {
            &self.target_column
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }
        if self.effective_target_column().trim().is_empty() {
            return Err(anyhow!("Target column must not be empty"));
        }
        if self.sheets.iter().all(|sheet| sheet.trim().is_empty()) {
            return Err(anyhow!("At least one sheet must be configured"));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(anyhow!(
                "Batch size must be between 1 and {} (got {})",
                MAX_BATCH_SIZE,
                self.batch_size
            ));
        }
        if self.translation.common.max_retries == 0 {
            return Err(anyhow!("max_retries must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.translation.common.temperature) {
            return Err(anyhow!(
                "Temperature must be between 0.0 and 2.0 (got {})",
                self.translation.common.temperature
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(anyhow!("Store path must not be empty"));
        }
        if self.store.keys_column.trim().is_empty() {
            return Err(anyhow!("Keys column must not be empty"));
        }

        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint URL for {}: {}", self.translation.provider.display_name(), endpoint))?;

        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider (set it in the config or {})",
                self.translation.provider.display_name(),
                self.translation.provider.api_key_env_var()
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: "French".to_string(),
            target_column: String::new(),
            sheets: vec!["UI".to_string()],
            batch_size: default_batch_size(),
            batch_cooldown_ms: default_batch_cooldown_ms(),
            max_consecutive_batch_failures: None,
            translation: TranslationConfig::default(),
            store: StoreConfig::default(),
            logs_dir: default_logs_dir(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::Gemini => default_gemini_model(),
            TranslationProvider::OpenAI => default_openai_model(),
        }
    }

    /// Get the API key for the active provider, falling back to its environment variable
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        std::env::var(self.provider.api_key_env_var())
            .map(|key| key.trim().to_string())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::Gemini => default_gemini_endpoint(),
            TranslationProvider::OpenAI => default_openai_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Gemini));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));

        config
    }
}
