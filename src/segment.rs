/*!
 * Translatable segments loaded from the tabular store.
 */

use serde::{Deserialize, Serialize};

/// One translatable row of a sheet.
///
/// Segments are immutable once loaded; results are produced as separate
/// records addressed by `row_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Sheet the row belongs to
    pub sheet: String,

    /// Physical row number in the backing store, used as the write-back address
    pub row_index: usize,

    /// Identifier, unique within the sheet
    pub key: String,

    /// Text in the source language
    pub source_text: String,

    /// Target cell content at load time
    #[serde(default)]
    pub existing_target: String,

    /// Optional context hint for translators
    #[serde(default)]
    pub comment: String,

    /// Row is flagged to be copied verbatim instead of translated
    #[serde(default)]
    pub do_not_translate: bool,
}

impl Segment {
    /// Create a segment with no existing target, comment or flag
    pub fn new(
        sheet: impl Into<String>,
        row_index: usize,
        key: impl Into<String>,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            row_index,
            key: key.into(),
            source_text: source_text.into(),
            existing_target: String::new(),
            comment: String::new(),
            do_not_translate: false,
        }
    }

    /// Set the existing target text
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.existing_target = target.into();
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the do-not-translate flag
    pub fn with_do_not_translate(mut self, flag: bool) -> Self {
        self.do_not_translate = flag;
        self
    }

    /// Whether this segment must be sent to the provider
    pub fn needs_translation(&self) -> bool {
        if self.source_text.trim().is_empty() {
            return false;
        }
        if self.do_not_translate {
            return false;
        }
        self.existing_target.trim().is_empty()
    }

    /// Whether this segment should be copied source to target verbatim.
    ///
    /// Only rows whose target is still blank are copied, so repeated runs do nothing.
    pub fn needs_copy(&self) -> bool {
        self.do_not_translate
            && !self.source_text.trim().is_empty()
            && self.existing_target.trim().is_empty()
    }
}
