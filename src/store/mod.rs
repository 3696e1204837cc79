/*!
 * Tabular store capability.
 *
 * A store exposes named sheets made of a header row and data rows. Reading
 * returns a self-contained snapshot; writing sets one column for a set of
 * rows and persists the sheet before returning. No state is assumed to
 * survive between calls.
 *
 * - `csv_workbook`: a directory with one CSV file per sheet
 * - `memory`: an in-process workbook for tests
 */

use log::{debug, warn};
use std::collections::BTreeMap;

use crate::errors::StoreError;
use crate::segment::Segment;

pub mod csv_workbook;
pub mod memory;

pub use csv_workbook::CsvWorkbook;
pub use memory::MemoryWorkbook;

/// Physical row number of the first data row (row 1 holds the headers)
pub const FIRST_DATA_ROW: usize = 2;

/// Snapshot of one sheet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Create a table, padding short rows to the header width
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self {
            name: name.into(),
            headers,
            rows,
        };
        table.normalize();
        table
    }

    fn normalize(&mut self) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len());
        self.headers.resize(width, String::new());
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Index of a column by exact header name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == column)
    }

    /// Cell content, empty when out of range
    pub fn cell(&self, data_index: usize, column: usize) -> &str {
        self.rows
            .get(data_index)
            .and_then(|row| row.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Set `column` for the given physical rows, appending the column on the right if absent
    ///
    /// All row addresses are checked before anything is modified.
    pub fn set_column(
        &mut self,
        column: &str,
        values: &BTreeMap<usize, String>,
    ) -> Result<(), StoreError> {
        for &row_index in values.keys() {
            if row_index < FIRST_DATA_ROW || row_index - FIRST_DATA_ROW >= self.rows.len() {
                return Err(StoreError::InvalidRow {
                    sheet: self.name.clone(),
                    row_index,
                });
            }
        }

        let column_index = match self.column_index(column) {
            Some(index) => index,
            None => {
                warn!(
                    "[Store] Created column '{}' in sheet '{}' at position {}",
                    column,
                    self.name,
                    self.headers.len() + 1
                );
                self.headers.push(column.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };

        for (&row_index, text) in values {
            self.rows[row_index - FIRST_DATA_ROW][column_index] = text.clone();
        }
        Ok(())
    }
}

/// Capability over a workbook of named sheets
pub trait SheetStore: Send + Sync {
    /// Names of all sheets, in workbook order
    fn sheet_names(&self) -> Result<Vec<String>, StoreError>;

    /// Read a whole sheet
    fn read_sheet(&self, sheet: &str) -> Result<SheetTable, StoreError>;

    /// Write `row_index -> text` into `column` and persist the sheet
    fn write_column(
        &self,
        sheet: &str,
        column: &str,
        values: &BTreeMap<usize, String>,
    ) -> Result<(), StoreError>;
}

/// Column names that map sheet rows to segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub keys_column: String,
    pub source_column: String,
    pub target_column: String,
    pub comment_column: String,
    pub do_not_translate_column: String,
}

impl SheetLayout {
    /// Build segments from a sheet snapshot
    ///
    /// The keys and source columns are required; target, comment and
    /// do-not-translate columns are optional. Rows without a key are skipped.
    pub fn segments_from_table(&self, table: &SheetTable) -> Result<Vec<Segment>, StoreError> {
        let require = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| StoreError::MissingColumn {
                    sheet: table.name.clone(),
                    column: column.to_string(),
                })
        };
        let keys = require(&self.keys_column)?;
        let source = require(&self.source_column)?;

        let target = table.column_index(&self.target_column);
        let comment = table.column_index(&self.comment_column);
        let do_not_translate = table.column_index(&self.do_not_translate_column);

        if target.is_none() {
            warn!("[{}] Target column '{}' not found", table.name, self.target_column);
        }
        if comment.is_none() {
            debug!("[{}] Comment column '{}' not found", table.name, self.comment_column);
        }
        if do_not_translate.is_none() {
            debug!(
                "[{}] Do-not-translate column '{}' not found",
                table.name, self.do_not_translate_column
            );
        }

        let optional = |data_index: usize, column: Option<usize>| {
            column
                .map(|c| table.cell(data_index, c).to_string())
                .unwrap_or_default()
        };

        let mut segments = Vec::with_capacity(table.rows.len());
        for data_index in 0..table.rows.len() {
            let key = table.cell(data_index, keys).trim();
            if key.is_empty() {
                continue;
            }

            let segment = Segment::new(
                table.name.as_str(),
                data_index + FIRST_DATA_ROW,
                key,
                table.cell(data_index, source),
            )
            .with_target(optional(data_index, target))
            .with_comment(optional(data_index, comment))
            .with_do_not_translate(!optional(data_index, do_not_translate).trim().is_empty());

            segments.push(segment);
        }

        Ok(segments)
    }

    /// Read a sheet from `store` and build its segments
    pub fn load_segments(
        &self,
        store: &dyn SheetStore,
        sheet: &str,
    ) -> Result<Vec<Segment>, StoreError> {
        let table = store.read_sheet(sheet)?;
        let segments = self.segments_from_table(&table)?;
        debug!("[{}] Loaded {} segments", sheet, segments.len());
        Ok(segments)
    }
}
