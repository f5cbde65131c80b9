// ==========================================
// 展会访客分析导出 - 导出配置
// ==========================================
// 职责: 导出参数的默认值、环境变量覆盖、校验与快照
// 优先级: 默认值 < 环境变量 < config_kv 覆写
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::types::SlotPlan;
use crate::engine::day_resolver::{parse_date, DayResolver};

/// 停留超时阈值默认值（分钟）
pub const DEFAULT_OVERSTAY_MINUTES: u32 = 120;
/// 拥堵阈值默认值（单楼栋单时段入场数）
pub const DEFAULT_CONGESTION_THRESHOLD: u32 = 10;
pub const DEFAULT_EXHIBITION_DAYS: u32 = 5;
pub const DEFAULT_OUTPUT_DIR: &str = "exports";
pub const DEFAULT_BUSIEST_LIMIT: usize = 10;
pub const DEFAULT_TRANSITION_LIMIT: usize = 50;
pub const DEFAULT_REPEAT_VISITOR_LIMIT: usize = 20;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

/// 环境变量名
pub mod env_keys {
    pub const START_DATE: &str = "EXHIBITION_START_DATE";
    pub const EXHIBITION_DAYS: &str = "EXHIBITION_DAYS";
    pub const OUTPUT_DIR: &str = "EXPORT_OUTPUT_DIR";
}

/// config_kv 中的配置键（scope_id = 'global'）
pub mod config_keys {
    pub const START_DATE: &str = "exhibition_start_date";
    pub const EXHIBITION_DAYS: &str = "exhibition_days";
    pub const OUTPUT_DIR: &str = "export_output_dir";

    // 开放时段
    pub const OPEN_HOUR: &str = "open_hour";
    pub const CLOSE_HOUR: &str = "close_hour";
    pub const SLOT_HOURS: &str = "slot_hours";

    // 列表条数
    pub const BUSIEST_LIMIT: &str = "busiest_limit";
    pub const TRANSITION_LIMIT: &str = "transition_limit";
    pub const REPEAT_VISITOR_LIMIT: &str = "repeat_visitor_limit";

    // 异常阈值
    pub const OVERSTAY_MINUTES: &str = "overstay_minutes";
    pub const CONGESTION_THRESHOLD: &str = "congestion_threshold";

    pub const ACQUIRE_TIMEOUT_MS: &str = "acquire_timeout_ms";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值无效: {key}={value}")]
    InvalidValue { key: String, value: String },

    #[error("配置校验失败: {0}")]
    Validation(String),

    #[error("配置读取失败: {0}")]
    Storage(String),

    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub start_date: NaiveDate,
    pub exhibition_days: u32,
    pub output_dir: PathBuf,
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_hours: u32,
    pub busiest_limit: usize,
    pub transition_limit: usize,
    pub repeat_visitor_limit: usize,
    pub overstay_minutes: u32,
    pub congestion_threshold: u32,
    pub acquire_timeout_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let slots = SlotPlan::default();
        Self {
            start_date: DayResolver::default().start_date(),
            exhibition_days: DEFAULT_EXHIBITION_DAYS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            open_hour: slots.open_hour,
            close_hour: slots.close_hour,
            slot_hours: slots.slot_hours,
            busiest_limit: DEFAULT_BUSIEST_LIMIT,
            transition_limit: DEFAULT_TRANSITION_LIMIT,
            repeat_visitor_limit: DEFAULT_REPEAT_VISITOR_LIMIT,
            overstay_minutes: DEFAULT_OVERSTAY_MINUTES,
            congestion_threshold: DEFAULT_CONGESTION_THRESHOLD,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> ConfigResult<T> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_start_date(key: &str, raw: &str) -> ConfigResult<NaiveDate> {
    parse_date(raw).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

impl ExportConfig {
    /// 默认值 + 进程环境变量
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 默认值 + 给定的环境变量来源
    ///
    /// 空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get(env_keys::START_DATE) {
            config.start_date = parse_start_date(env_keys::START_DATE, &raw)?;
        }
        if let Some(raw) = get(env_keys::EXHIBITION_DAYS) {
            config.exhibition_days = parse_value(env_keys::EXHIBITION_DAYS, &raw)?;
        }
        if let Some(raw) = get(env_keys::OUTPUT_DIR) {
            config.output_dir = PathBuf::from(raw.trim());
        }
        Ok(config)
    }

    /// 应用 config_kv 覆写；未知键忽略
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> ConfigResult<usize> {
        let mut applied = 0;
        for (key, raw) in overrides {
            match key.as_str() {
                config_keys::START_DATE => self.start_date = parse_start_date(key, raw)?,
                config_keys::EXHIBITION_DAYS => self.exhibition_days = parse_value(key, raw)?,
                config_keys::OUTPUT_DIR => self.output_dir = PathBuf::from(raw.trim()),
                config_keys::OPEN_HOUR => self.open_hour = parse_value(key, raw)?,
                config_keys::CLOSE_HOUR => self.close_hour = parse_value(key, raw)?,
                config_keys::SLOT_HOURS => self.slot_hours = parse_value(key, raw)?,
                config_keys::BUSIEST_LIMIT => self.busiest_limit = parse_value(key, raw)?,
                config_keys::TRANSITION_LIMIT => self.transition_limit = parse_value(key, raw)?,
                config_keys::REPEAT_VISITOR_LIMIT => self.repeat_visitor_limit = parse_value(key, raw)?,
                config_keys::OVERSTAY_MINUTES => self.overstay_minutes = parse_value(key, raw)?,
                config_keys::CONGESTION_THRESHOLD => self.congestion_threshold = parse_value(key, raw)?,
                config_keys::ACQUIRE_TIMEOUT_MS => self.acquire_timeout_ms = parse_value(key, raw)?,
                _ => {
                    tracing::debug!(config_key = %key, "忽略与导出无关的配置项");
                    continue;
                }
            }
            applied += 1;
        }
        Ok(applied)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.exhibition_days == 0 {
            return Err(ConfigError::Validation("exhibition_days 必须 >= 1".to_string()));
        }
        if self.open_hour >= self.close_hour || self.close_hour > 24 {
            return Err(ConfigError::Validation(format!(
                "开放时段无效: open_hour={}, close_hour={}",
                self.open_hour, self.close_hour
            )));
        }
        if self.slot_hours == 0 || self.slot_hours > 24 {
            return Err(ConfigError::Validation(format!(
                "slot_hours 必须在 1-24 之间: {}",
                self.slot_hours
            )));
        }
        if self.busiest_limit == 0 || self.transition_limit == 0 || self.repeat_visitor_limit == 0 {
            return Err(ConfigError::Validation("列表条数必须 >= 1".to_string()));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(ConfigError::Validation("acquire_timeout_ms 必须 > 0".to_string()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("output_dir 不能为空".to_string()));
        }
        Ok(())
    }

    pub fn slot_plan(&self) -> SlotPlan {
        SlotPlan {
            open_hour: self.open_hour,
            close_hour: self.close_hour,
            slot_hours: self.slot_hours,
        }
    }

    pub fn day_resolver(&self) -> DayResolver {
        DayResolver::new(self.start_date)
    }

    /// 配置快照（JSON），写入日志便于核对导出参数
    pub fn snapshot(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
