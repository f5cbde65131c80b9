// ==========================================
// ExportApi 集成测试
// ==========================================
// 测试目标: 路由参数校验、异步生成、批量导出
// ==========================================


use std::fs;
use std::sync::Arc;

use exhibition_export::api::{ApiError, ExportApi};
use exhibition_export::logging;
use exhibition_export::repository::SqliteQueryExecutor;
use exhibition_export::{ReportFormat, ReportGenerator, ReportKind, ReportParams};
use test_helpers::{seeded_memory_connection, test_config, MockExecutor};

fn mock_api(dir: &std::path::Path) -> ExportApi {
    let config = test_config(dir);
    let generator = Arc::new(ReportGenerator::from_config(Arc::new(MockExecutor), &config));
    ExportApi::new(generator, config.exhibition_days)
}

#[tokio::test]
async fn test_day_out_of_range_is_invalid_input() {
    let tmp = tempfile::tempdir().unwrap();
    let api = mock_api(tmp.path());

    let err = api
        .generate(ReportKind::Attendance, ReportFormat::Csv, ReportParams::for_day(99))
        .await
        .unwrap_err();
    match err {
        ApiError::InvalidInput(msg) => assert_eq!(msg, "Invalid day. Allowed values are 1-5."),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(fs::read_dir(tmp.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn test_generate_from_route() {
    let tmp = tempfile::tempdir().unwrap();
    let api = mock_api(tmp.path());

    let report = api
        .generate_from_route("movement", "csv", "2", None, None)
        .await
        .unwrap();
    assert_eq!(report.kind, ReportKind::Movement);
    assert_eq!(report.day, 2);
    assert_eq!(report.content_type, "text/csv");
    assert!(report.path.exists());

    let report = api
        .generate_from_route("security", "PDF", "1", Some("60"), Some("4"))
        .await
        .unwrap();
    assert_eq!(report.content_type, "application/pdf");
}

#[tokio::test]
async fn test_generate_from_route_rejects_bad_params() {
    let tmp = tempfile::tempdir().unwrap();
    let api = mock_api(tmp.path());

    let cases = [
        ("heatmap", "pdf", "1", None),
        ("event", "csv", "1", None),
        ("attendance", "csv", "abc", None),
        ("attendance", "csv", "0", None),
        ("security", "pdf", "1", Some("lots")),
    ];
    for (report, format, day, overstay) in cases {
        let err = api
            .generate_from_route(report, format, day, overstay, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::InvalidInput(_)),
            "{} {} {} -> {:?}",
            report,
            format,
            day,
            err
        );
    }
}

#[tokio::test]
async fn test_generate_all_produces_six_files() {
    let tmp = tempfile::tempdir().unwrap();
    let api = mock_api(tmp.path());

    let results = api.generate_all(1).await.unwrap();
    assert_eq!(results.len(), 6);
    let reports: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
    assert!(reports.iter().all(|r| r.path.exists()));
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 6);

    let csv_count = reports.iter().filter(|r| r.format == ReportFormat::Csv).count();
    assert_eq!(csv_count, 2);
}

#[tokio::test]
async fn test_generate_all_rejects_invalid_day() {
    let tmp = tempfile::tempdir().unwrap();
    let api = mock_api(tmp.path());
    assert!(matches!(api.generate_all(6).await, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_generate_all_on_sqlite_store() {
    logging::init_test();
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let executor = Arc::new(SqliteQueryExecutor::with_default_timeout(seeded_memory_connection()));
    let generator = Arc::new(ReportGenerator::from_config(executor, &config));
    let api = ExportApi::new(generator, config.exhibition_days);

    let results = api.generate_all(1).await.unwrap();
    assert!(results.iter().all(|r| r.is_ok()));

    let attendance = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .find(|r| r.kind == ReportKind::Attendance && r.format == ReportFormat::Csv)
        .unwrap();
    let text = fs::read_to_string(&attendance.path).unwrap();
    assert!(text.contains("Engineering,B1,3,2,1,130.0,10:00\n"));
}
