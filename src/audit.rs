/*!
 * Audit log of per-segment outcomes.
 *
 * The log is an append-only event stream: every processed segment adds one
 * record per pass and nothing is ever rewritten. A consumer wanting the final
 * state of a key takes the last record for it (see [`final_statuses`]).
 */

use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::AuditError;

/// Header row of the audit file
pub const AUDIT_HEADER: [&str; 5] = ["sheet", "key", "row_idx", "target_lang", "status"];

/// Terminal status of a segment for one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentStatus {
    /// Translation accepted and staged for write-back
    Ok,
    /// Provider returned nothing usable for the key
    NoTranslation,
    /// A protected token was dropped by the provider
    MissingTokens,
    /// All tokens present but reordered
    TokensOutOfOrder,
    /// Do-not-translate row copied verbatim
    CopiedSource,
}

impl SegmentStatus {
    /// Wire representation used in the audit file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoTranslation => "NO_TRANSLATION",
            Self::MissingTokens => "MISSING_TOKENS",
            Self::TokensOutOfOrder => "TOKENS_OUT_OF_ORDER",
            Self::CopiedSource => "COPIED_SOURCE",
        }
    }

    /// Whether the segment leaves the pending pool
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::CopiedSource)
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentStatus {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OK" => Ok(Self::Ok),
            "NO_TRANSLATION" => Ok(Self::NoTranslation),
            "MISSING_TOKENS" => Ok(Self::MissingTokens),
            "TOKENS_OUT_OF_ORDER" => Ok(Self::TokensOutOfOrder),
            "COPIED_SOURCE" => Ok(Self::CopiedSource),
            other => Err(AuditError::UnknownStatus(other.to_string())),
        }
    }
}

/// One audit entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub sheet: String,
    pub key: String,
    pub row_index: usize,
    pub target_language: String,
    pub status: SegmentStatus,
}

impl AuditRecord {
    /// Create a record
    pub fn new(
        sheet: impl Into<String>,
        key: impl Into<String>,
        row_index: usize,
        target_language: impl Into<String>,
        status: SegmentStatus,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            key: key.into(),
            row_index,
            target_language: target_language.into(),
            status,
        }
    }

    fn to_fields(&self) -> [String; 5] {
        [
            self.sheet.clone(),
            self.key.clone(),
            self.row_index.to_string(),
            self.target_language.clone(),
            self.status.as_str().to_string(),
        ]
    }
}

/// Ordered, append-only sink for audit records
pub trait AuditSink: Send + Sync {
    /// Append one record
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Audit log backed by a CSV file
#[derive(Debug)]
pub struct CsvAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvAuditLog {
    /// Create a log at `path`; the file is created on first append
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the audit file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for CsvAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let _guard = self.lock.lock();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            debug!("Creating audit log {}", self.path.display());
            writer.write_record(AUDIT_HEADER)?;
        }
        writer.write_record(record.to_fields())?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory audit log, mainly for tests
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in append order
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Last status recorded for a key
    pub fn latest_status(&self, sheet: &str, key: &str) -> Option<SegmentStatus> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|record| record.sheet == sheet && record.key == key)
            .map(|record| record.status)
    }

    /// Number of records with the given status
    pub fn count(&self, status: SegmentStatus) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.status == status)
            .count()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Read an audit file and keep the last status per `(sheet, key)`
pub fn final_statuses<P: AsRef<Path>>(
    path: P,
) -> Result<BTreeMap<(String, String), SegmentStatus>, AuditError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut statuses = BTreeMap::new();

    for row in reader.records() {
        let row = row?;
        let sheet = row.get(0).unwrap_or_default().to_string();
        let key = row.get(1).unwrap_or_default().to_string();
        let status: SegmentStatus = row.get(4).unwrap_or_default().parse()?;
        statuses.insert((sheet, key), status);
    }

    Ok(statuses)
}
