/*!
 * # sheetloc - machine translation for tabular localization files
 *
 * A Rust library that translates spreadsheet-style localization tables with an
 * LLM while keeping embedded markup intact.
 *
 * ## Features
 *
 * - Reversible protection of variables (`{[name]}`) and tags (`<b>`) behind
 *   indexed tokens, with order-aware validation of every translation
 * - Batched requests to Gemini or OpenAI with retry, backoff and cooldowns
 * - Partial-failure tolerance and a gap-filling pass for completeness
 * - Append-only CSV audit log of every per-key decision
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Wires configuration to store, provider and pipeline
 * - `segment`: Translatable row model
 * - `translation`: Token protection, batching, gateway, throttling and orchestration
 * - `validation`: Token survival checks
 * - `store`: Tabular store capability and backends
 * - `audit`: Per-key audit log
 * - `providers`: Client implementations for LLM providers:
 *   - `providers::gemini`: Gemini API client
 *   - `providers::openai`: OpenAI API client
 * - `logging`: Process logger
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audit;
pub mod errors;
pub mod logging;
pub mod providers;
pub mod segment;
pub mod store;
pub mod translation;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use audit::{AuditRecord, AuditSink, SegmentStatus};
pub use errors::{AppError, AuditError, PipelineError, ProviderError, StoreError};
pub use segment::Segment;
pub use store::{SheetLayout, SheetStore};
pub use translation::{PipelineOrchestrator, RunSummary, TokenProtector};
pub use validation::{TokenValidator, ValidationOutcome};
