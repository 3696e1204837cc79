/*!
 * Tests for the per-key audit log
 */

use sheetloc::audit::{
    AUDIT_HEADER, AuditRecord, AuditSink, CsvAuditLog, MemoryAuditLog, SegmentStatus, final_statuses,
};
use sheetloc::errors::AuditError;

use crate::common;

#[test]
fn test_csvAuditLog_shouldAppendRowsInOrder() {
    let dir = common::create_temp_dir().unwrap();
    let log = CsvAuditLog::new(dir.path().join("mt_keys_run.csv"));

    log.append(&AuditRecord::new("UI", "A", 2, "French", SegmentStatus::Ok)).unwrap();
    log.append(&AuditRecord::new("UI", "B", 3, "French", SegmentStatus::NoTranslation)).unwrap();
    log.append(&AuditRecord::new("MATCH", "C", 2, "French", SegmentStatus::CopiedSource)).unwrap();

    let content = std::fs::read_to_string(log.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], AUDIT_HEADER.join(","));
    assert_eq!(lines[1], "UI,A,2,French,OK");
    assert_eq!(lines[2], "UI,B,3,French,NO_TRANSLATION");
    assert_eq!(lines[3], "MATCH,C,2,French,COPIED_SOURCE");
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_csvAuditLog_withCommaInKey_shouldQuoteField() {
    let dir = common::create_temp_dir().unwrap();
    let log = CsvAuditLog::new(dir.path().join("keys.csv"));

    log.append(&AuditRecord::new("UI", "MSG,1", 4, "French", SegmentStatus::Ok)).unwrap();

    let statuses = final_statuses(log.path()).unwrap();
    assert_eq!(
        statuses.get(&("UI".to_string(), "MSG,1".to_string())),
        Some(&SegmentStatus::Ok)
    );
}

#[test]
fn test_finalStatuses_shouldKeepLastStatusPerKey() {
    let dir = common::create_temp_dir().unwrap();
    let log = CsvAuditLog::new(dir.path().join("keys.csv"));

    log.append(&AuditRecord::new("UI", "A", 2, "French", SegmentStatus::MissingTokens)).unwrap();
    log.append(&AuditRecord::new("UI", "B", 3, "French", SegmentStatus::NoTranslation)).unwrap();
    log.append(&AuditRecord::new("UI", "A", 2, "French", SegmentStatus::Ok)).unwrap();

    let statuses = final_statuses(log.path()).unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[&("UI".to_string(), "A".to_string())], SegmentStatus::Ok);
    assert_eq!(statuses[&("UI".to_string(), "B".to_string())], SegmentStatus::NoTranslation);
}

#[test]
fn test_finalStatuses_withUnknownStatus_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "keys.csv",
        "sheet,key,row_idx,target_lang,status\nUI,A,2,French,DONE\n",
    )
    .unwrap();

    assert!(matches!(final_statuses(&path), Err(AuditError::UnknownStatus(s)) if s == "DONE"));
}

#[test]
fn test_segmentStatus_isTerminal_shouldOnlyIncludeOkAndCopied() {
    assert!(SegmentStatus::Ok.is_terminal());
    assert!(SegmentStatus::CopiedSource.is_terminal());
    assert!(!SegmentStatus::NoTranslation.is_terminal());
    assert!(!SegmentStatus::MissingTokens.is_terminal());
    assert!(!SegmentStatus::TokensOutOfOrder.is_terminal());
}

#[test]
fn test_memoryAuditLog_shouldTrackLatestStatus() {
    let log = MemoryAuditLog::new();
    log.append(&AuditRecord::new("UI", "A", 2, "French", SegmentStatus::TokensOutOfOrder)).unwrap();
    log.append(&AuditRecord::new("UI", "A", 2, "French", SegmentStatus::Ok)).unwrap();

    assert_eq!(log.latest_status("UI", "A"), Some(SegmentStatus::Ok));
    assert_eq!(log.latest_status("UI", "B"), None);
    assert_eq!(log.count(SegmentStatus::TokensOutOfOrder), 1);
    assert_eq!(log.records().len(), 2);
}
