// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{LevelFilter, error, info, warn};

use sheetloc::app_config::{self, Config, TranslationProvider};
use sheetloc::app_controller::Controller;
use sheetloc::logging;
use sheetloc::translation::RunSummary;

/// Exit code used when the run is interrupted with Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the configured sheets (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for sheetloc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct TranslateArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Target language name (e.g. 'French', 'Portuguese_BR')
    #[arg(short, long, env = "TARGET_LANG")]
    target_language: Option<String>,

    /// Column receiving the translations
    #[arg(long)]
    target_column: Option<String>,

    /// Comma-separated list of sheets to translate
    #[arg(short, long, env = "SHEETS_TO_TRANSLATE", value_delimiter = ',')]
    sheets: Option<Vec<String>>,

    /// Segments per request
    #[arg(short, long, env = "BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Cooldown between batches, in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Workbook directory (one CSV file per sheet)
    #[arg(long)]
    store: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

/// sheetloc - machine translation for tabular localization files
///
/// Translates localization sheets with an LLM while keeping variables and
/// markup tags intact, then runs a second pass to fill any gaps.
#[derive(Parser, Debug)]
#[command(name = "sheetloc")]
#[command(version)]
#[command(about = "LLM-powered translation of localization sheets")]
#[command(long_about = "sheetloc translates localization sheets using Gemini or OpenAI, protecting \
variables ({[name]}) and tags (<b>) so they come back unchanged and in order.

EXAMPLES:
    sheetloc                                     # Translate using conf.json
    sheetloc -t German --target-column German    # Override the target language and column
    sheetloc -s UI,MATCH -b 25                   # Only two sheets, smaller batches
    sheetloc -p openai -m gpt-4o-mini            # Use a specific provider and model
    sheetloc completions bash > sheetloc.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. API keys fall back to GEMINI_API_KEY / OPENAI_API_KEY.

OUTPUT:
    Translations are written into the workbook. Each run also writes
    logs/mt_keys_<run_id>.csv (per-key audit) and logs/mt_run_<run_id>.log.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    logging::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    let args = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sheetloc", &mut std::io::stdout());
            return Ok(());
        }
        Some(Commands::Translate(args)) => args,
        None => cli.translate,
    };

    tokio::select! {
        result = run_translate(args) => result,
        _ = wait_for_interrupt(tokio::signal::ctrl_c()) => {
            warn!("Interrupted, aborting remaining sheets");
            log::logger().flush();
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

/// Resolve once `signal` fires; never resolve if the handler could not be installed
async fn wait_for_interrupt<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(target_column) = &options.target_column {
        config.target_column = target_column.clone();
    }
    if let Some(sheets) = &options.sheets {
        config.sheets = sheets
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(batch_size) = options.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(cooldown_ms) = options.cooldown_ms {
        config.batch_cooldown_ms = cooldown_ms;
    }
    if let Some(store) = &options.store {
        config.store.path = store.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        logging::set_level(config_log_level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;
    logging::set_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    logging::attach_run_log(controller.run_log_path())?;

    match controller.run(!options.no_progress).await {
        Ok(summary) => {
            print_summary(&controller, &summary);
            Ok(())
        }
        Err(e) => {
            error!("[Main] Fatal error: {:#}", e);
            Err(e)
        }
    }
}

fn print_summary(controller: &Controller, summary: &RunSummary) {
    info!("Translated {} segments", summary.translated());
    if summary.gaps_filled() > 0 {
        info!("Filled {} gaps", summary.gaps_filled());
    } else {
        info!("No gaps filled");
    }
    if summary.copied() > 0 {
        info!("Copied {} do-not-translate segments", summary.copied());
    }
    if summary.remaining_gaps() > 0 {
        warn!("{} segments still lack a translation", summary.remaining_gaps());
    }
    for sheet in &summary.missing_sheets {
        warn!("Sheet '{}' was not found", sheet);
    }
    for (sheet, reason) in &summary.failed_sheets {
        warn!("Sheet '{}' failed: {}", sheet, reason);
    }
    info!("Audit log: {}", controller.keys_log_path().display());
}
