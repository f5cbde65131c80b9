// ==========================================
// 导出配置集成测试
// ==========================================
// 测试目标: 默认值 -> 环境变量 -> config_kv 覆写 的叠加顺序，
//           以及覆写对报表生成的实际影响
// ==========================================


use std::collections::HashMap;
use std::fs;

use exhibition_export::api::ApiError;
use exhibition_export::app::AppState;
use exhibition_export::config::{config_keys, ConfigError, ConfigManager, ExportConfig};
use exhibition_export::{ReportFormat, ReportKind, ReportParams};
use test_helpers::{create_seeded_db, test_config};

#[test]
fn test_env_layer() {
    let env: HashMap<&str, &str> = [
        ("EXHIBITION_START_DATE", "2026-03-01"),
        ("EXHIBITION_DAYS", "3"),
        ("EXPORT_OUTPUT_DIR", "  "),
    ]
    .into_iter()
    .collect();

    let config = ExportConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
    assert_eq!(config.start_date.to_string(), "2026-03-01");
    assert_eq!(config.exhibition_days, 3);
    // 空白值视为未设置
    assert_eq!(config.output_dir, ExportConfig::default().output_dir);
}

#[test]
fn test_env_layer_rejects_bad_date() {
    let result = ExportConfig::from_lookup(|key| {
        (key == "EXHIBITION_START_DATE").then(|| "28/10/2025".to_string())
    });
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_config_kv_overrides_honoured() {
    let (dir, db_path) = create_seeded_db();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager.set_global_config_value(config_keys::TRANSITION_LIMIT, "1").unwrap();
    manager.set_global_config_value(config_keys::START_DATE, "2025-10-27").unwrap();
    manager.set_global_config_value("unrelated_key", "x").unwrap();
    drop(manager);

    let state = AppState::with_config(db_path, test_config(&dir.path().join("out"))).unwrap();
    assert_eq!(state.config.transition_limit, 1);
    assert_eq!(state.config.start_date.to_string(), "2025-10-27");

    // 起始日期前移一天: 展会第 2 天 = 2025-10-28（预置数据所在日期）
    let path = state
        .generator
        .generate(ReportKind::Movement, ReportFormat::Csv, &ReportParams::for_day(2))
        .unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("movement_flow_day2_2025-10-28_"), "{}", name);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("Zone Transitions (Top 1)\n"));
    assert!(text.contains("B1,B2,2\n"));
    assert!(!text.contains("B2,B1,1\n"));
}

#[tokio::test]
async fn test_exhibition_days_override_limits_api() {
    let (dir, db_path) = create_seeded_db();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager.set_global_config_value(config_keys::EXHIBITION_DAYS, "3").unwrap();
    drop(manager);

    let state = AppState::with_config(db_path, test_config(dir.path())).unwrap();
    let err = state
        .export_api
        .generate(ReportKind::Attendance, ReportFormat::Pdf, ReportParams::for_day(4))
        .await
        .unwrap_err();
    match err {
        ApiError::InvalidInput(msg) => assert_eq!(msg, "Invalid day. Allowed values are 1-3."),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_invalid_override_fails_startup() {
    let (dir, db_path) = create_seeded_db();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager.set_global_config_value(config_keys::SLOT_HOURS, "0").unwrap();
    drop(manager);

    assert!(AppState::with_config(db_path, test_config(dir.path())).is_err());
}

#[test]
fn test_security_thresholds_from_config() {
    let (dir, db_path) = create_seeded_db();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager.set_global_config_value(config_keys::OVERSTAY_MINUTES, "35").unwrap();
    manager.set_global_config_value(config_keys::CONGESTION_THRESHOLD, "1").unwrap();
    drop(manager);

    let state = AppState::with_config(db_path, test_config(dir.path())).unwrap();
    let settings = state.generator.settings();
    assert_eq!(settings.overstay_minutes, 35);
    assert_eq!(settings.congestion_threshold, 1);

    let path = state.generator.security_pdf(1, None, None).unwrap();
    let bytes = fs::read(&path).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("> 35 min"));
    assert!(text.contains("> 1 entries"));
}
