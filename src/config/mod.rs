// ==========================================
// 展会访客分析导出 - 配置层
// ==========================================
// 职责: 导出配置管理,支持多级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod export_config;

pub use config_manager::ConfigManager;
pub use export_config::{config_keys, ConfigError, ConfigResult, ExportConfig};
