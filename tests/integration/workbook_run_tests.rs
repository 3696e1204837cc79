/*!
 * End-to-end runs: CSV workbook on disk, mock provider behind the real
 * gateway, CSV audit log, wired through the application controller.
 */

use std::sync::Arc;
use std::time::Duration;

use sheetloc::app_config::Config;
use sheetloc::app_controller::Controller;
use sheetloc::audit::{CsvAuditLog, SegmentStatus, final_statuses};
use sheetloc::providers::mock::MockProvider;
use sheetloc::store::{CsvWorkbook, SheetStore};
use sheetloc::translation::{ProviderGateway, RetryPolicy};

use crate::common;

const UI_SHEET: &str = "\
Keys,English,French,$comment,$donottranslate
MENU_PLAY,Play,,,
MENU_GREET,\"Hello, {[player]}!\",,,
MENU_TITLE,Tennis Manager 2025,,,x
MENU_DONE,Done,Fini,,
";

const MATCH_SHEET: &str = "\
Keys,English,French,$comment
SET_WON,<b>{[player]}</b> won the set,,
SET_LOST,{[player]} lost the set,,
";

fn config_for(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.sheets = vec!["UI".to_string(), "MATCH".to_string(), "MISSING".to_string()];
    config.store.path = dir.join("loc").to_string_lossy().to_string();
    config.logs_dir = dir.join("logs").to_string_lossy().to_string();
    config.batch_size = 2;
    config.batch_cooldown_ms = 22000;
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config
}

fn workbook(dir: &std::path::Path) -> CsvWorkbook {
    let root = dir.join("loc");
    std::fs::create_dir_all(&root).unwrap();
    common::create_test_sheet(&root, "UI", UI_SHEET).unwrap();
    common::create_test_sheet(&root, "MATCH", MATCH_SHEET).unwrap();
    CsvWorkbook::open(&root).unwrap()
}

fn gateway(provider: MockProvider) -> ProviderGateway {
    ProviderGateway::new(
        Box::new(provider),
        RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(100),
            rate_limit_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(10),
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_controllerRun_withMockProvider_shouldFillWorkbookAndAudit() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let store = Arc::new(workbook(dir.path()));
    let controller = Controller::with_run_id(config_for(dir.path()), "20250101_000000").unwrap();
    let audit = Arc::new(CsvAuditLog::new(controller.keys_log_path()));
    let provider = MockProvider::working();

    let orchestrator = controller
        .build_orchestrator(store.clone(), Arc::new(gateway(provider.clone())), audit, false)
        .unwrap();
    let summary = orchestrator.run(&controller.config().sheets).await.unwrap();

    assert_eq!(summary.missing_sheets, vec!["MISSING"]);
    assert_eq!(summary.translated(), 4);
    assert_eq!(summary.copied(), 1);
    assert_eq!(summary.remaining_gaps(), 0);
    assert_eq!(provider.request_count(), 2);

    let ui = store.read_sheet("UI").unwrap();
    assert_eq!(ui.cell(0, 2), "[TRANSLATED] Play");
    assert_eq!(ui.cell(1, 2), "[TRANSLATED] Hello, {[player]}!");
    assert_eq!(ui.cell(2, 2), "Tennis Manager 2025");
    assert_eq!(ui.cell(3, 2), "Fini");

    let matches = store.read_sheet("MATCH").unwrap();
    assert_eq!(matches.cell(0, 2), "[TRANSLATED] <b>{[player]}</b> won the set");

    let statuses = final_statuses(controller.keys_log_path()).unwrap();
    assert_eq!(statuses.len(), 5);
    assert_eq!(
        statuses[&("UI".to_string(), "MENU_TITLE".to_string())],
        SegmentStatus::CopiedSource
    );
    assert_eq!(
        statuses[&("MATCH".to_string(), "SET_LOST".to_string())],
        SegmentStatus::Ok
    );
}

#[tokio::test(start_paused = true)]
async fn test_controllerRun_withMissingTargetColumn_shouldCreateIt() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let store = Arc::new(workbook(dir.path()));
    let mut config = config_for(dir.path());
    config.target_language = "German".to_string();
    config.sheets = vec!["MATCH".to_string()];
    let controller = Controller::with_run_id(config, "run").unwrap();
    let audit = Arc::new(CsvAuditLog::new(controller.keys_log_path()));

    let orchestrator = controller
        .build_orchestrator(store.clone(), Arc::new(gateway(MockProvider::working())), audit, false)
        .unwrap();
    orchestrator.run(&controller.config().sheets).await.unwrap();

    let table = store.read_sheet("MATCH").unwrap();
    assert_eq!(table.headers.last().map(String::as_str), Some("German"));
    let german = table.column_index("German").unwrap();
    assert_eq!(table.cell(1, german), "[TRANSLATED] {[player]} lost the set");
}

#[tokio::test(start_paused = true)]
async fn test_controllerRun_withBadCredentials_shouldLeaveGaps() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let store = Arc::new(workbook(dir.path()));
    let controller = Controller::with_run_id(config_for(dir.path()), "run").unwrap();
    let keys_log = controller.keys_log_path();
    let audit = Arc::new(CsvAuditLog::new(&keys_log));
    let provider = MockProvider::unauthorized();

    let orchestrator = controller
        .build_orchestrator(store.clone(), Arc::new(gateway(provider.clone())), audit, false)
        .unwrap();
    let summary = orchestrator.run(&controller.config().sheets).await.unwrap();

    // UI: 1 batch + MATCH: 1 batch, in both passes; no retries on auth errors
    assert_eq!(provider.request_count(), 4);
    assert_eq!(summary.failed_batches(), 4);
    assert_eq!(summary.translated(), 0);
    assert_eq!(summary.remaining_gaps(), 4);
    // The do-not-translate row is still copied
    assert_eq!(summary.copied(), 1);
    assert_eq!(store.read_sheet("UI").unwrap().cell(0, 2), "");

    let statuses = final_statuses(&keys_log).unwrap();
    assert_eq!(statuses.len(), 1);
}
