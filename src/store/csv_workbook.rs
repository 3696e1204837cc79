/*!
 * Directory workbook: one `<sheet>.csv` file per sheet.
 *
 * Writes go to a temporary file in the same directory, which then replaces
 * the sheet file in a single rename.
 */

use log::info;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::StoreError;
use crate::store::{SheetStore, SheetTable};

const SHEET_EXTENSION: &str = "csv";

/// Workbook stored as a directory of CSV files
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
}

impl CsvWorkbook {
    /// Open a workbook directory
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Workbook directory not found: {}", root.display()),
            )));
        }
        Ok(Self { root })
    }

    /// Directory holding the sheets
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.root.join(format!("{}.{}", sheet, SHEET_EXTENSION))
    }

    fn save(&self, table: &SheetTable) -> Result<(), StoreError> {
        let temp = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = csv::Writer::from_writer(temp.as_file());
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(self.sheet_path(&table.name))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl SheetStore for CsvWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_sheet = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(SHEET_EXTENSION))
                .unwrap_or(false);
            if !is_sheet || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_sheet(&self, sheet: &str) -> Result<SheetTable, StoreError> {
        let path = self.sheet_path(sheet);
        if !path.is_file() {
            return Err(StoreError::SheetNotFound(sheet.to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(File::open(&path)?));

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(SheetTable::new(sheet, headers, rows))
    }

    fn write_column(
        &self,
        sheet: &str,
        column: &str,
        values: &BTreeMap<usize, String>,
    ) -> Result<(), StoreError> {
        if values.is_empty() {
            info!("[{}] No translations to write", sheet);
            return Ok(());
        }

        let mut table = self.read_sheet(sheet)?;
        table.set_column(column, values)?;
        self.save(&table)?;

        info!("[{}] Wrote {} cells to column '{}'", sheet, values.len(), column);
        Ok(())
    }
}
