// ==========================================
// 展会访客分析导出 - 展会日解析器
// ==========================================
// 职责: 展会日序号 (1-based) -> 日历日期
// 规则: date = start_date + (day - 1)，按日历日相加，不做时区/时钟偏移换算
// 非法输入（缺失/0/负数/NaN/非有限/非整数/非数字）一律返回 None，调用方必须拒绝请求
// ==========================================

use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::domain::types::ResolvedDay;

/// 默认开展日期
pub const DEFAULT_START_DATE: &str = "2025-10-28";

/// DayResolver - 展会日解析器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayResolver {
    start_date: NaiveDate,
}

impl Default for DayResolver {
    fn default() -> Self {
        // 常量日期必然合法
        Self {
            start_date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap_or_default(),
        }
    }
}

impl DayResolver {
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    /// 从 YYYY-MM-DD 文本构造；日期非法时返回 None
    pub fn from_date_str(start_date: &str) -> Option<Self> {
        parse_date(start_date).map(Self::new)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// 解析展会日
    ///
    /// # 返回
    /// - Some(ResolvedDay): day >= 1 且日期未溢出
    /// - None: 非法输入
    pub fn resolve(&self, day: i64) -> Option<ResolvedDay> {
        if day < 1 {
            return None;
        }
        let day = u32::try_from(day).ok()?;
        let date = self
            .start_date
            .checked_add_days(Days::new(u64::from(day - 1)))?;
        Some(ResolvedDay { day, date })
    }

    /// 解析路由参数等原始文本
    ///
    /// 接受 "3"、" 3 "、"3.0"；拒绝 ""、"abc"、"NaN"、"inf"、"2.5"、"0"、"-1"
    pub fn resolve_raw(&self, raw: &str) -> Option<ResolvedDay> {
        parse_day_number(raw).and_then(|day| self.resolve(day))
    }

    /// 解析 JSON 请求体中的 day 字段（null/缺失/字符串/数字）
    pub fn resolve_value(&self, value: &Value) -> Option<ResolvedDay> {
        match value {
            Value::Number(n) => {
                if let Some(day) = n.as_i64() {
                    self.resolve(day)
                } else {
                    n.as_f64()
                        .and_then(integral_day)
                        .and_then(|day| self.resolve(day))
                }
            }
            Value::String(s) => self.resolve_raw(s),
            _ => None,
        }
    }

    /// 反向映射：日历日期 -> 展会日；开展前返回 None
    pub fn day_for_date(&self, date: NaiveDate) -> Option<u32> {
        let offset = date.signed_duration_since(self.start_date).num_days();
        if offset < 0 {
            return None;
        }
        u32::try_from(offset + 1).ok()
    }
}

/// 解析 YYYY-MM-DD
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// 文本 -> 展会日整数（不校验范围）
pub fn parse_day_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(day) = trimmed.parse::<i64>() {
        return Some(day);
    }
    trimmed.parse::<f64>().ok().and_then(integral_day)
}

fn integral_day(value: f64) -> Option<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}
