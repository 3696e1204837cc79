/*!
 * In-memory workbook.
 */

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::StoreError;
use crate::store::{SheetStore, SheetTable};

/// Workbook kept in process memory
#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Mutex<Vec<SheetTable>>,
    writes: AtomicUsize,
}

impl MemoryWorkbook {
    /// Create an empty workbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet from string slices
    pub fn with_sheet(self, name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        let table = SheetTable::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        );
        self.sheets.lock().push(table);
        self
    }

    /// Snapshot of a sheet
    pub fn sheet(&self, name: &str) -> Option<SheetTable> {
        self.sheets.lock().iter().find(|s| s.name == name).cloned()
    }

    /// Cell content by physical row number and column header
    pub fn cell(&self, sheet: &str, row_index: usize, column: &str) -> Option<String> {
        let table = self.sheet(sheet)?;
        let column = table.column_index(column)?;
        let data_index = row_index.checked_sub(super::FIRST_DATA_ROW)?;
        table.rows.get(data_index)?.get(column).cloned()
    }

    /// Number of successful `write_column` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SheetStore for MemoryWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.sheets.lock().iter().map(|s| s.name.clone()).collect())
    }

    fn read_sheet(&self, sheet: &str) -> Result<SheetTable, StoreError> {
        self.sheet(sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
    }

    fn write_column(
        &self,
        sheet: &str,
        column: &str,
        values: &BTreeMap<usize, String>,
    ) -> Result<(), StoreError> {
        if values.is_empty() {
            return Ok(());
        }

        let mut sheets = self.sheets.lock();
        let table = sheets
            .iter_mut()
            .find(|s| s.name == sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?;

        table.set_column(column, values)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
