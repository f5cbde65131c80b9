// ==========================================
// 展会访客分析导出 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::export_config::{ConfigError, ConfigResult, ExportConfig};
use crate::db::{configure_sqlite_connection, open_sqlite_connection, DEFAULT_BUSY_TIMEOUT_MS};

/// 全局作用域
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&conn_guard, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))
    }

    /// 分析库可能不含 config_kv（只读导出场景），此时视为无覆写
    fn has_config_table(conn: &Connection) -> ConfigResult<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='config_kv' LIMIT 1",
                [],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;
        if !Self::has_config_table(&conn)? {
            return Ok(None);
        }

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 读取全部 global 覆写
    pub fn load_overrides(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.lock()?;
        if !Self::has_config_table(&conn)? {
            return Ok(HashMap::new());
        }

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut overrides = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            overrides.insert(key, value);
        }
        Ok(overrides)
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let overrides = self.load_overrides()?;
        Ok(serde_json::to_string(&json!(overrides))?)
    }

    /// 在基础配置（默认值 + 环境变量）上叠加 config_kv 覆写并校验
    pub fn load_export_config(&self, base: ExportConfig) -> ConfigResult<ExportConfig> {
        let mut config = base;
        let overrides = self.load_overrides()?;
        let applied = config.apply_overrides(&overrides)?;
        config.validate()?;

        tracing::info!(
            overrides = applied,
            start_date = %config.start_date,
            exhibition_days = config.exhibition_days,
            output_dir = %config.output_dir.display(),
            "导出配置已加载"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::export_config::config_keys;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_get_set_global_value() {
        let manager = manager();
        assert_eq!(manager.get_global_config_value(config_keys::OVERSTAY_MINUTES).unwrap(), None);

        manager.set_global_config_value(config_keys::OVERSTAY_MINUTES, "90").unwrap();
        manager.set_global_config_value(config_keys::OVERSTAY_MINUTES, "60").unwrap();
        assert_eq!(
            manager.get_global_config_value(config_keys::OVERSTAY_MINUTES).unwrap(),
            Some("60".to_string())
        );
    }

    #[test]
    fn test_load_export_config_applies_overrides() {
        let manager = manager();
        manager.set_global_config_value(config_keys::CONGESTION_THRESHOLD, "5").unwrap();
        manager.set_global_config_value(config_keys::EXHIBITION_DAYS, "3").unwrap();

        let config = manager.load_export_config(ExportConfig::default()).unwrap();
        assert_eq!(config.congestion_threshold, 5);
        assert_eq!(config.exhibition_days, 3);
        assert_eq!(config.overstay_minutes, 120);
    }

    #[test]
    fn test_load_export_config_rejects_invalid_override() {
        let manager = manager();
        manager.set_global_config_value(config_keys::EXHIBITION_DAYS, "0").unwrap();
        assert!(matches!(
            manager.load_export_config(ExportConfig::default()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_config_table_means_no_overrides() {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        assert!(manager.load_overrides().unwrap().is_empty());
        assert_eq!(
            manager.load_export_config(ExportConfig::default()).unwrap(),
            ExportConfig::default()
        );
    }

    #[test]
    fn test_config_snapshot() {
        let manager = manager();
        manager.set_global_config_value(config_keys::SLOT_HOURS, "2").unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value["slot_hours"], "2");
    }
}
