use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, TranslationProvider};
use crate::audit::{AuditSink, CsvAuditLog};
use crate::providers::Provider;
use crate::providers::gemini::Gemini;
use crate::providers::openai::OpenAI;
use crate::store::{CsvWorkbook, SheetLayout, SheetStore};
use crate::translation::{
    PipelineOrchestrator, PipelineSettings, PromptTemplate, ProviderGateway, RetryPolicy,
    RunSummary, TranslationGateway,
};

// @module: Application controller wiring configuration to the pipeline

/// Main application controller for a translation run
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Identifier shared by this run's artefacts
    run_id: String,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let run_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::with_run_id(config, run_id)
    }

    /// Create a controller with an explicit run id
    pub fn with_run_id(config: Config, run_id: impl Into<String>) -> Result<Self> {
        let run_id = run_id.into();
        if run_id.trim().is_empty() {
            return Err(anyhow!("Run id must not be empty"));
        }
        Ok(Self { config, run_id })
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Identifier of this run
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Audit log path: `<logs_dir>/mt_keys_<run_id>.csv`
    pub fn keys_log_path(&self) -> PathBuf {
        Path::new(&self.config.logs_dir).join(format!("mt_keys_{}.csv", self.run_id))
    }

    /// Run log path: `<logs_dir>/mt_run_<run_id>.log`
    pub fn run_log_path(&self) -> PathBuf {
        Path::new(&self.config.logs_dir).join(format!("mt_run_{}.log", self.run_id))
    }

    /// Column layout derived from the configuration
    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            keys_column: self.config.store.keys_column.clone(),
            source_column: self.config.source_language.clone(),
            target_column: self.config.effective_target_column().to_string(),
            comment_column: self.config.store.comment_column.clone(),
            do_not_translate_column: self.config.store.donottranslate_column.clone(),
        }
    }

    /// Retry policy for the provider gateway
    pub fn retry_policy(&self) -> RetryPolicy {
        let common = &self.config.translation.common;
        RetryPolicy {
            max_attempts: common.max_retries,
            backoff_base: Duration::from_millis(common.retry_backoff_ms),
            rate_limit_wait: Duration::from_millis(common.rate_limit_wait_ms),
            max_wait: Duration::from_millis(common.max_retry_wait_ms),
        }
    }

    /// Render the instructions sent with every batch
    pub fn instructions(&self) -> Result<String> {
        let common = &self.config.translation.common;
        let template = match common.instructions_file.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };
        Ok(template
            .with_extra(common.extra_instructions.as_deref())
            .render(&self.config.source_language, &self.config.target_language))
    }

    /// Pipeline settings derived from the configuration
    pub fn pipeline_settings(&self, show_progress: bool) -> Result<PipelineSettings> {
        Ok(PipelineSettings {
            target_language: self.config.target_language.clone(),
            batch_size: self.config.batch_size,
            cooldown: Duration::from_millis(self.config.batch_cooldown_ms),
            max_consecutive_batch_failures: self.config.max_consecutive_batch_failures,
            instructions: self.instructions()?,
            show_progress,
        })
    }

    /// Build the client for the configured provider
    pub fn build_provider(&self) -> Box<dyn Provider> {
        let translation = &self.config.translation;
        let api_key = translation.get_api_key();
        let endpoint = translation.get_endpoint();
        let model = translation.get_model();
        let temperature = translation.common.temperature;
        let timeout = Duration::from_secs(translation.get_timeout_secs());

        match translation.provider {
            TranslationProvider::Gemini => {
                Box::new(Gemini::new(api_key, endpoint, model, temperature, timeout))
            }
            TranslationProvider::OpenAI => {
                Box::new(OpenAI::new(api_key, endpoint, model, temperature, timeout))
            }
        }
    }

    /// Assemble an orchestrator around the given collaborators
    pub fn build_orchestrator(
        &self,
        store: Arc<dyn SheetStore>,
        gateway: Arc<dyn TranslationGateway>,
        audit: Arc<dyn AuditSink>,
        show_progress: bool,
    ) -> Result<PipelineOrchestrator> {
        Ok(PipelineOrchestrator::new(
            store,
            gateway,
            audit,
            self.layout(),
            self.pipeline_settings(show_progress)?,
        ))
    }

    /// Run the whole pipeline against the configured workbook and provider
    pub async fn run(&self, show_progress: bool) -> Result<RunSummary> {
        let store_path = &self.config.store.path;
        let store = CsvWorkbook::open(store_path)
            .with_context(|| format!("Failed to open workbook: {}", store_path))?;

        let translation = &self.config.translation;
        info!(
            "sheetloc: {} - {} | {} -> {} | run {}",
            translation.provider.display_name(),
            translation.get_model(),
            self.config.source_language,
            self.config.target_language,
            self.run_id
        );
        debug!("Audit log: {}", self.keys_log_path().display());

        let gateway = ProviderGateway::new(self.build_provider(), self.retry_policy());
        let audit = CsvAuditLog::new(self.keys_log_path());
        let orchestrator = self.build_orchestrator(
            Arc::new(store),
            Arc::new(gateway),
            Arc::new(audit),
            show_progress,
        )?;

        let summary = orchestrator.run(&self.config.sheets).await?;
        Ok(summary)
    }
}
