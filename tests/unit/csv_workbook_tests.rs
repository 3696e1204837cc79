/*!
 * Tests for the directory-of-CSV workbook
 */

use std::collections::BTreeMap;

use sheetloc::errors::StoreError;
use sheetloc::store::{CsvWorkbook, SheetStore};

use crate::common;

#[test]
fn test_open_withMissingDirectory_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    assert!(CsvWorkbook::open(dir.path().join("nope")).is_err());
}

#[test]
fn test_sheetNames_shouldListCsvStemsSorted() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_sheet(dir.path(), "UI", "Keys,English\n").unwrap();
    common::create_test_sheet(dir.path(), "MATCH", "Keys,English\n").unwrap();
    common::create_test_file(dir.path(), "notes.txt", "ignored").unwrap();

    let workbook = CsvWorkbook::open(dir.path()).unwrap();

    assert_eq!(workbook.sheet_names().unwrap(), vec!["MATCH", "UI"]);
}

#[test]
fn test_readSheet_shouldPadShortRowsAndKeepQuotedFields() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_sheet(
        dir.path(),
        "UI",
        "Keys,English,French\nGREET,\"Hello, {[player]}!\"\nBYE,Bye,Au revoir\n",
    )
    .unwrap();
    let workbook = CsvWorkbook::open(dir.path()).unwrap();

    let table = workbook.read_sheet("UI").unwrap();

    assert_eq!(table.headers, vec!["Keys", "English", "French"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.cell(0, 1), "Hello, {[player]}!");
    assert_eq!(table.cell(0, 2), "");
    assert_eq!(table.cell(1, 2), "Au revoir");
}

#[test]
fn test_readSheet_withUnknownSheet_shouldReturnNotFound() {
    let dir = common::create_temp_dir().unwrap();
    let workbook = CsvWorkbook::open(dir.path()).unwrap();

    assert!(matches!(workbook.read_sheet("UI"), Err(StoreError::SheetNotFound(name)) if name == "UI"));
}

#[test]
fn test_writeColumn_shouldPersistOnlyAddressedRows() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_sheet(
        dir.path(),
        "UI",
        "Keys,English,French\nA,One,\nB,Two,Deux\nC,Three,\n",
    )
    .unwrap();
    let workbook = CsvWorkbook::open(dir.path()).unwrap();

    let values = BTreeMap::from([(2, "Un".to_string()), (4, "Trois, enfin".to_string())]);
    workbook.write_column("UI", "French", &values).unwrap();

    let reopened = CsvWorkbook::open(dir.path()).unwrap();
    let table = reopened.read_sheet("UI").unwrap();
    assert_eq!(table.cell(0, 2), "Un");
    assert_eq!(table.cell(1, 2), "Deux");
    assert_eq!(table.cell(2, 2), "Trois, enfin");
}

#[test]
fn test_writeColumn_withMissingColumn_shouldAppendIt() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_sheet(dir.path(), "UI", "Keys,English\nA,One\n").unwrap();
    let workbook = CsvWorkbook::open(dir.path()).unwrap();

    workbook
        .write_column("UI", "German", &BTreeMap::from([(2, "Eins".to_string())]))
        .unwrap();

    let table = workbook.read_sheet("UI").unwrap();
    assert_eq!(table.headers, vec!["Keys", "English", "German"]);
    assert_eq!(table.cell(0, 2), "Eins");
}

#[test]
fn test_writeColumn_withOutOfRangeRow_shouldLeaveFileUntouched() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_sheet(dir.path(), "UI", "Keys,English,French\nA,One,\n").unwrap();
    let before = std::fs::read_to_string(&path).unwrap();
    let workbook = CsvWorkbook::open(dir.path()).unwrap();

    let values = BTreeMap::from([(2, "Un".to_string()), (9, "Neuf".to_string())]);
    let result = workbook.write_column("UI", "French", &values);

    assert!(matches!(result, Err(StoreError::InvalidRow { row_index: 9, .. })));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}
