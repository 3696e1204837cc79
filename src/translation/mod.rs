/*!
 * Translation pipeline for tabular localization data.
 *
 * It is split into several submodules:
 *
 * - `placeholders`: Reversible protection of markup spans
 * - `batch`: Partitioning of pending segments into batches
 * - `gateway`: Provider request/response contract with retry and backoff
 * - `prompts`: Instruction templates
 * - `throttle`: Cooldown gate between provider calls
 * - `orchestrator`: Main pass and gap-filling pass over sheets
 */

// Re-export main types for easier usage
pub use self::batch::build_batches;
pub use self::gateway::{
    BatchRequest, ProviderGateway, RetryPolicy, SegmentPayload, TranslationGateway,
};
pub use self::orchestrator::{PassKind, PassReport, PipelineOrchestrator, PipelineSettings, RunSummary};
pub use self::placeholders::{ProtectedText, TokenCategory, TokenMap, TokenProtector};
pub use self::prompts::PromptTemplate;
pub use self::throttle::RateGate;

// Submodules
pub mod batch;
pub mod gateway;
pub mod orchestrator;
pub mod placeholders;
pub mod prompts;
pub mod throttle;
