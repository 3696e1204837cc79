/*!
 * Pipeline orchestrator.
 *
 * Drives every configured sheet through two sweeps:
 * 1. Main pass: each sheet in order, batch by batch, one write-back per sheet
 * 2. Gap-filling pass: once all sheets are done, each sheet is reloaded and
 *    whatever still lacks a target goes through the same procedure again
 *
 * Failures are contained at the smallest possible scope: a bad segment never
 * aborts its batch, a failed batch never aborts its sheet and a broken sheet
 * never aborts the run.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditRecord, AuditSink, SegmentStatus};
use crate::errors::{PipelineError, ProviderError, StoreError};
use crate::segment::Segment;
use crate::store::{SheetLayout, SheetStore};
use crate::translation::batch::build_batches;
use crate::translation::gateway::{BatchRequest, SegmentPayload, TranslationGateway};
use crate::translation::placeholders::TokenProtector;
use crate::translation::throttle::RateGate;
use crate::validation::TokenValidator;

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Target language name, recorded in the audit log
    pub target_language: String,
    /// Segments per provider request
    pub batch_size: usize,
    /// Minimum delay between two provider requests of the same sheet pass
    pub cooldown: Duration,
    /// Abandon the rest of a pass after this many failed batches in a row
    pub max_consecutive_batch_failures: Option<u32>,
    /// Rendered instructions sent with every batch
    pub instructions: String,
    /// Draw a progress bar per pass
    pub show_progress: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            target_language: "French".to_string(),
            batch_size: 50,
            cooldown: Duration::from_millis(22000),
            max_consecutive_batch_failures: None,
            instructions: String::new(),
            show_progress: false,
        }
    }
}

/// Which sweep a pass belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Main,
    GapFill,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::GapFill => write!(f, "gap-fill"),
        }
    }
}

/// Per-segment results of one batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Restored translations ready for write-back, by row
    pub accepted: BTreeMap<usize, String>,
    /// Status of every segment of the batch, in batch order
    pub statuses: Vec<(usize, SegmentStatus)>,
}

/// Counters for one pass over one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub sheet: String,
    pub kind: PassKind,
    /// Segments that needed translation at the start of the pass
    pub pending: usize,
    /// Segments accepted and written
    pub translated: usize,
    /// Do-not-translate segments copied verbatim
    pub copied: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub no_translation: usize,
    pub missing_tokens: usize,
    pub tokens_out_of_order: usize,
    /// Segments never sent because the pass was abandoned
    pub abandoned: usize,
}

impl PassReport {
    fn new(sheet: &str, kind: PassKind) -> Self {
        Self {
            sheet: sheet.to_string(),
            kind,
            pending: 0,
            translated: 0,
            copied: 0,
            batches: 0,
            failed_batches: 0,
            no_translation: 0,
            missing_tokens: 0,
            tokens_out_of_order: 0,
            abandoned: 0,
        }
    }

    /// Segments rejected by validation or left without a translation
    pub fn rejected(&self) -> usize {
        self.no_translation + self.missing_tokens + self.tokens_out_of_order
    }

    fn count(&mut self, status: SegmentStatus) {
        match status {
            SegmentStatus::Ok => self.translated += 1,
            SegmentStatus::CopiedSource => self.copied += 1,
            SegmentStatus::NoTranslation => self.no_translation += 1,
            SegmentStatus::MissingTokens => self.missing_tokens += 1,
            SegmentStatus::TokensOutOfOrder => self.tokens_out_of_order += 1,
        }
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sheets that were found in the store, in processing order
    pub sheets: Vec<String>,
    /// Configured sheets absent from the store
    pub missing_sheets: Vec<String>,
    /// Sheets that failed with a store error, with the reason
    pub failed_sheets: Vec<(String, String)>,
    /// Every pass that ran
    pub passes: Vec<PassReport>,
}

impl RunSummary {
    fn sum(&self, kind: PassKind, field: impl Fn(&PassReport) -> usize) -> usize {
        self.passes.iter().filter(|p| p.kind == kind).map(field).sum()
    }

    /// Segments accepted during the main pass
    pub fn translated(&self) -> usize {
        self.sum(PassKind::Main, |p| p.translated)
    }

    /// Segments accepted during the gap-filling pass
    pub fn gaps_filled(&self) -> usize {
        self.sum(PassKind::GapFill, |p| p.translated)
    }

    /// Do-not-translate segments copied across both passes
    pub fn copied(&self) -> usize {
        self.passes.iter().map(|p| p.copied).sum()
    }

    /// Failed batches across both passes
    pub fn failed_batches(&self) -> usize {
        self.passes.iter().map(|p| p.failed_batches).sum()
    }

    /// Segments still pending after the gap-filling pass
    pub fn remaining_gaps(&self) -> usize {
        self.passes
            .iter()
            .filter(|p| p.kind == PassKind::GapFill)
            .map(|p| p.pending.saturating_sub(p.translated))
            .sum()
    }
}

/// Drives sheets through the gateway and records every decision
pub struct PipelineOrchestrator {
    store: Arc<dyn SheetStore>,
    gateway: Arc<dyn TranslationGateway>,
    audit: Arc<dyn AuditSink>,
    layout: SheetLayout,
    settings: PipelineSettings,
    gate: RateGate,
}

impl PipelineOrchestrator {
    /// Create an orchestrator
    pub fn new(
        store: Arc<dyn SheetStore>,
        gateway: Arc<dyn TranslationGateway>,
        audit: Arc<dyn AuditSink>,
        layout: SheetLayout,
        settings: PipelineSettings,
    ) -> Self {
        let gate = RateGate::new(settings.cooldown);
        Self {
            store,
            gateway,
            audit,
            layout,
            settings,
            gate,
        }
    }

    /// Cooldowns actually waited so far
    pub fn cooldowns_applied(&self) -> usize {
        self.gate.cooldowns_applied()
    }

    /// Run the main pass over `sheets`, then the gap-filling pass
    ///
    /// Only a store that cannot be listed, or a sheet list with no match in
    /// the store, fails the run.
    pub async fn run(&self, sheets: &[String]) -> Result<RunSummary, PipelineError> {
        info!("=== Starting translation for {} ===", self.settings.target_language);

        let existing = self.store.sheet_names()?;
        let mut summary = RunSummary::default();
        for sheet in sheets {
            if existing.contains(sheet) {
                summary.sheets.push(sheet.clone());
            } else {
                warn!("Sheet '{}' not found in the store, skipping", sheet);
                summary.missing_sheets.push(sheet.clone());
            }
        }

        if summary.sheets.is_empty() {
            error!("No valid sheets to process");
            return Err(PipelineError::NoValidSheets(sheets.join(", ")));
        }

        info!("Starting translation ({} sheets)", summary.sheets.len());
        let mut unreadable = Vec::new();
        for sheet in &summary.sheets {
            info!("--- Processing sheet '{}' ---", sheet);
            let segments = match self.layout.load_segments(self.store.as_ref(), sheet) {
                Ok(segments) => segments,
                Err(e) => {
                    error!("[{}] Sheet skipped: {}", sheet, e);
                    unreadable.push(sheet.clone());
                    summary.failed_sheets.push((sheet.clone(), e.to_string()));
                    continue;
                }
            };
            match self.main_pass(sheet, &segments).await {
                Ok(report) => summary.passes.push(report),
                Err(e) => {
                    error!("[{}] Write-back failed, leaving rows to the gap-filling pass: {}", sheet, e);
                    summary.failed_sheets.push((sheet.clone(), e.to_string()));
                }
            }
        }
        info!("Total segments translated: {}", summary.translated());

        info!("Starting gap-filling phase");
        for sheet in &summary.sheets {
            if unreadable.contains(sheet) {
                continue;
            }
            match self.fill_gaps_in_sheet(sheet).await {
                Ok(report) => summary.passes.push(report),
                Err(e) => {
                    error!("[Verify] Gap filling failed for '{}': {}", sheet, e);
                    summary.failed_sheets.push((sheet.clone(), e.to_string()));
                }
            }
        }
        info!("Total gaps filled: {}", summary.gaps_filled());
        info!("=== Translation complete ===");

        Ok(summary)
    }

    /// Main pass over one sheet
    pub async fn translate_sheet(&self, sheet: &str) -> Result<PassReport, StoreError> {
        info!("--- Processing sheet '{}' ---", sheet);
        let segments = self.layout.load_segments(self.store.as_ref(), sheet)?;
        self.main_pass(sheet, &segments).await
    }

    async fn main_pass(&self, sheet: &str, segments: &[Segment]) -> Result<PassReport, StoreError> {
        let report = self.run_pass(sheet, segments, PassKind::Main).await?;
        info!("[{}] Translated {} segments", sheet, report.translated);
        Ok(report)
    }

    /// Gap-filling pass over one sheet, reloading it from the store first
    pub async fn fill_gaps_in_sheet(&self, sheet: &str) -> Result<PassReport, StoreError> {
        debug!("[Verify] Checking for gaps in '{}'...", sheet);
        let segments = self.layout.load_segments(self.store.as_ref(), sheet)?;
        let report = self.run_pass(sheet, &segments, PassKind::GapFill).await?;
        if report.pending > 0 {
            info!("[Verify] Filled {} of {} gaps in '{}'", report.translated, report.pending, sheet);
        }
        Ok(report)
    }

    async fn run_pass(
        &self,
        sheet: &str,
        segments: &[Segment],
        kind: PassKind,
    ) -> Result<PassReport, StoreError> {
        let mut report = PassReport::new(sheet, kind);
        let mut staged: BTreeMap<usize, String> = BTreeMap::new();

        for segment in segments.iter().filter(|s| s.needs_copy()) {
            debug!("[{}] Copying source for do-not-translate key={}", sheet, segment.key);
            staged.insert(segment.row_index, segment.source_text.clone());
            self.record(segment, SegmentStatus::CopiedSource);
            report.count(SegmentStatus::CopiedSource);
        }

        let pending: Vec<Segment> = segments
            .iter()
            .filter(|s| s.needs_translation())
            .cloned()
            .collect();
        report.pending = pending.len();

        if pending.is_empty() {
            match kind {
                PassKind::Main => info!("[{}] No segments to translate", sheet),
                PassKind::GapFill => debug!("[Verify] No gaps in '{}'", sheet),
            }
        } else {
            if kind == PassKind::GapFill {
                info!("[Verify] Found {} gaps in '{}', attempting to fill...", pending.len(), sheet);
            }
            self.run_batches(sheet, &pending, kind, &mut report, &mut staged).await;
        }

        if !staged.is_empty() {
            if let Err(e) = self.store.write_column(sheet, &self.layout.target_column, &staged) {
                self.revoke(segments, &staged);
                return Err(e);
            }
        }

        Ok(report)
    }

    async fn run_batches(
        &self,
        sheet: &str,
        pending: &[Segment],
        kind: PassKind,
        report: &mut PassReport,
        staged: &mut BTreeMap<usize, String>,
    ) {
        let batches = build_batches(pending, self.settings.batch_size);
        report.batches = batches.len();
        debug!("[{}] {} segments in {} batches ({} pass)", sheet, pending.len(), batches.len(), kind);

        let progress = self.progress_bar(sheet, kind, batches.len());
        self.gate.reset();
        let mut consecutive_failures: u32 = 0;

        for (index, batch) in batches.iter().enumerate() {
            if let Some(limit) = self.settings.max_consecutive_batch_failures {
                if limit > 0 && consecutive_failures >= limit {
                    let remaining: usize = batches[index..].iter().map(Vec::len).sum();
                    report.abandoned = remaining;
                    error!(
                        "[{}] {} consecutive batch failures, abandoning {} remaining segments",
                        sheet, consecutive_failures, remaining
                    );
                    break;
                }
            }

            self.gate.acquire().await;
            debug!("[{}] Processing batch {}/{} ({} segments)", sheet, index + 1, batches.len(), batch.len());
            let result = self.process_batch(batch).await;
            self.gate.release();

            match result {
                Ok(outcome) => {
                    consecutive_failures = 0;
                    for (_, status) in &outcome.statuses {
                        report.count(*status);
                    }
                    staged.extend(outcome.accepted);
                }
                Err(e) => {
                    consecutive_failures += 1;
                    report.failed_batches += 1;
                    error!("[{}] Batch {} failed: {}", sheet, index + 1, e);
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
    }

    /// Translate one batch and decide the status of each of its segments
    ///
    /// Returns `Err` only when the gateway produced nothing for the batch.
    pub async fn process_batch(&self, batch: &[Segment]) -> Result<BatchOutcome, ProviderError> {
        let payloads = batch
            .iter()
            .map(|segment| SegmentPayload {
                key: segment.key.clone(),
                sheet: segment.sheet.clone(),
                protected_source: TokenProtector::protect(&segment.source_text).text,
                comment: segment.comment.clone(),
            })
            .collect();
        let request = BatchRequest::new(self.settings.instructions.clone(), payloads);

        let translations = self.gateway.translate_batch(&request).await?;

        let mut outcome = BatchOutcome::default();
        for segment in batch {
            let status = match translations.get(&segment.key) {
                Some(text) if !text.trim().is_empty() => {
                    self.accept(segment, text, &mut outcome.accepted)
                }
                _ => {
                    debug!("[MT] No translation for key={}", segment.key);
                    SegmentStatus::NoTranslation
                }
            };
            self.record(segment, status);
            outcome.statuses.push((segment.row_index, status));
        }

        Ok(outcome)
    }

    fn accept(
        &self,
        segment: &Segment,
        translated: &str,
        accepted: &mut BTreeMap<usize, String>,
    ) -> SegmentStatus {
        let protected = TokenProtector::protect(&segment.source_text);
        let source_tokens = TokenProtector::extract_tokens(&protected.text);
        let validation = TokenValidator::validate_tokens(&source_tokens, translated);

        if !validation.missing_tokens.is_empty() {
            warn!(
                "[MT] Validation failed for key={}: missing={:?}",
                segment.key, validation.missing_tokens
            );
            return SegmentStatus::MissingTokens;
        }
        if validation.out_of_order {
            warn!(
                "[MT] Validation failed for key={}: tokens out of order {:?}",
                segment.key, validation.target_tokens
            );
            return SegmentStatus::TokensOutOfOrder;
        }

        let restored = TokenProtector::restore(translated, &protected.tokens);
        debug!("[MT] Translated key={} row={}", segment.key, segment.row_index);
        accepted.insert(segment.row_index, restored);
        SegmentStatus::Ok
    }

    /// Record `NO_TRANSLATION` for staged rows whose write-back failed
    fn revoke(&self, segments: &[Segment], staged: &BTreeMap<usize, String>) {
        for segment in segments.iter().filter(|s| staged.contains_key(&s.row_index)) {
            self.record(segment, SegmentStatus::NoTranslation);
        }
    }

    fn record(&self, segment: &Segment, status: SegmentStatus) {
        let record = AuditRecord::new(
            segment.sheet.as_str(),
            segment.key.as_str(),
            segment.row_index,
            self.settings.target_language.as_str(),
            status,
        );
        if let Err(e) = self.audit.append(&record) {
            error!("Failed to append audit record for key={}: {}", segment.key, e);
        }
    }

    fn progress_bar(&self, sheet: &str, kind: PassKind, batches: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(batches as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} {msg} [{bar:40}] {pos}/{len}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("█▓▒░"));
        progress.set_message(match kind {
            PassKind::Main => sheet.to_string(),
            PassKind::GapFill => format!("{} (gaps)", sheet),
        });
        progress
    }
}
