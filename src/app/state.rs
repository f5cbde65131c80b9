// ==========================================
// 展会访客分析导出 - 应用状态
// ==========================================
// 职责: 装配共享连接、配置、报表生成器与导出 API
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::ExportApi;
use crate::config::{ConfigManager, ExportConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::report::ReportGenerator;
use crate::repository::SqliteQueryExecutor;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "EXHIBITION_EXPORT_DB_PATH";

/// 应用状态
///
/// 单个共享连接，由查询执行器与配置管理器共同持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生效配置（默认值 + 环境变量 + config_kv 覆写）
    pub config: ExportConfig,

    pub config_manager: Arc<ConfigManager>,

    pub generator: Arc<ReportGenerator>,

    pub export_api: Arc<ExportApi>,
}

impl AppState {
    /// 以环境变量为基础配置初始化
    pub fn new(db_path: String) -> Result<Self, String> {
        let base = ExportConfig::from_env().map_err(|e| format!("环境变量配置无效: {}", e))?;
        Self::with_config(db_path, base)
    }

    /// 以给定的基础配置初始化（config_kv 覆写仍然生效）
    pub fn with_config(db_path: String, base: ExportConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库结构初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config = config_manager
            .load_export_config(base)
            .map_err(|e| format!("导出配置无效: {}", e))?;

        let executor = Arc::new(SqliteQueryExecutor::new(
            conn,
            Duration::from_millis(config.acquire_timeout_ms),
        ));
        let generator = Arc::new(ReportGenerator::from_config(executor, &config));
        let export_api = Arc::new(ExportApi::new(generator.clone(), config.exhibition_days));

        tracing::info!(
            output_dir = %config.output_dir.display(),
            exhibition_days = config.exhibition_days,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            config,
            config_manager,
            generator,
            export_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先使用 EXHIBITION_EXPORT_DB_PATH；否则放在用户数据目录下
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./exhibition_analytics.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("exhibition-export");
        // 目录创建失败时仍返回该路径，由打开数据库时报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("exhibition_analytics.db");
    }

    path.to_string_lossy().to_string()
}
