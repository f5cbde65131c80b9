// ==========================================
// 展会访客分析导出 - 领域类型定义
// ==========================================
// 职责: 展会日、报表类型/格式、时间段划分
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 已解析的展会日 (Resolved Day)
// ==========================================
// 不变量: date = start_date + (day - 1)，每次请求重新计算，不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedDay {
    /// 展会日序号（从 1 开始）
    pub day: u32,
    /// 对应的日历日期
    pub date: NaiveDate,
}

impl ResolvedDay {
    /// YYYY-MM-DD 格式的日期
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for ResolvedDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {} ({})", self.day, self.date_str())
    }
}

// ==========================================
// 报表类型 (Report Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    Attendance,   // 出勤与使用
    Movement,     // 人流动线
    Security,     // 安全与异常
    EventSummary, // 活动汇总
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Attendance,
        ReportKind::Movement,
        ReportKind::Security,
        ReportKind::EventSummary,
    ];

    /// 路由参数解析（attendance / movement / security / event）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "attendance" => Some(ReportKind::Attendance),
            "movement" => Some(ReportKind::Movement),
            "security" => Some(ReportKind::Security),
            "event" | "events" | "event_summary" => Some(ReportKind::EventSummary),
            _ => None,
        }
    }

    /// 文件名前缀（下游依赖此命名，不可修改）
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ReportKind::Attendance => "attendance_usage",
            ReportKind::Movement => "movement_flow",
            ReportKind::Security => "security_exception",
            ReportKind::EventSummary => "event_summary",
        }
    }

    /// 报表标题
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Attendance => "Attendance & Usage Report",
            ReportKind::Movement => "Movement & Flow Report",
            ReportKind::Security => "Security & Exception Report",
            ReportKind::EventSummary => "Event Summary Report",
        }
    }

    /// 该报表支持的输出格式
    pub fn supported_formats(&self) -> &'static [ReportFormat] {
        match self {
            ReportKind::Attendance | ReportKind::Movement => &[ReportFormat::Csv, ReportFormat::Pdf],
            ReportKind::Security | ReportKind::EventSummary => &[ReportFormat::Pdf],
        }
    }

    pub fn supports(&self, format: ReportFormat) -> bool {
        self.supported_formats().contains(&format)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportKind::Attendance => "attendance",
            ReportKind::Movement => "movement",
            ReportKind::Security => "security",
            ReportKind::EventSummary => "event",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// 输出格式 (Report Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportFormat {
    Csv,
    Pdf,
}

impl ReportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
        }
    }

    /// HTTP 下载使用的 Content-Type
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv",
            ReportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

// ==========================================
// 报表请求参数
// ==========================================
// 阈值为空时使用配置中的默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    pub day: i64,
    pub overstay_minutes: Option<u32>,
    pub congestion_threshold: Option<u32>,
}

impl ReportParams {
    pub fn for_day(day: i64) -> Self {
        Self {
            day,
            overstay_minutes: None,
            congestion_threshold: None,
        }
    }

    pub fn with_thresholds(mut self, overstay_minutes: u32, congestion_threshold: u32) -> Self {
        self.overstay_minutes = Some(overstay_minutes);
        self.congestion_threshold = Some(congestion_threshold);
        self
    }
}

// ==========================================
// 时间段 (Time Slot)
// ==========================================
/// 开放时段外的入场统一归入该时段键
pub const AFTER_HOURS_SLOT: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeSlot {
    /// 查询结果中使用的键，例如 "10-13"
    pub fn key(&self) -> String {
        format!("{}-{}", self.start_hour, self.end_hour)
    }

    /// 展示标签，例如 "10am-1pm"
    pub fn label(&self) -> String {
        format!("{}-{}", hour_label(self.start_hour), hour_label(self.end_hour))
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

fn hour_label(hour: u32) -> String {
    match hour % 24 {
        0 => "12am".to_string(),
        12 => "12pm".to_string(),
        h if h < 12 => format!("{}am", h),
        h => format!("{}pm", h - 12),
    }
}

/// 开放时段划分方案
///
/// 开放时间 [open_hour, close_hour) 按 slot_hours 切分，最后一段截断到 close_hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlan {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_hours: u32,
}

impl Default for SlotPlan {
    fn default() -> Self {
        Self {
            open_hour: 10,
            close_hour: 19,
            slot_hours: 3,
        }
    }
}

impl SlotPlan {
    pub fn slots(&self) -> Vec<TimeSlot> {
        let mut slots = Vec::new();
        if self.slot_hours == 0 {
            return slots;
        }
        let mut start = self.open_hour;
        while start < self.close_hour {
            let end = (start + self.slot_hours).min(self.close_hour);
            slots.push(TimeSlot {
                start_hour: start,
                end_hour: end,
            });
            start = end;
        }
        slots
    }

    pub fn slot_for_hour(&self, hour: u32) -> Option<TimeSlot> {
        self.slots().into_iter().find(|s| s.contains(hour))
    }

    /// 时段键在方案中的序号；after-hours 排在最后
    pub fn position(&self, key: &str) -> usize {
        self.slots()
            .iter()
            .position(|s| s.key() == key)
            .unwrap_or(usize::MAX)
    }

    /// 时段键 -> 展示标签（未知键原样返回）
    pub fn label_for_key(&self, key: &str) -> String {
        if key == AFTER_HOURS_SLOT {
            return "After hours".to_string();
        }
        self.slots()
            .into_iter()
            .find(|s| s.key() == key)
            .map(|s| s.label())
            .unwrap_or_else(|| key.to_string())
    }

    /// 生成 SQLite CASE 表达式，把时间列映射为时段键
    ///
    /// 小时值均为配置内的整数，直接内联到 SQL 中
    pub fn sql_case(&self, time_column: &str) -> String {
        let hour_expr = format!("CAST(strftime('%H', {}) AS INTEGER)", time_column);
        let mut sql = String::from("CASE");
        for slot in self.slots() {
            sql.push_str(&format!(
                " WHEN {h} >= {start} AND {h} < {end} THEN '{key}'",
                h = hour_expr,
                start = slot.start_hour,
                end = slot.end_hour,
                key = slot.key()
            ));
        }
        sql.push_str(&format!(" ELSE '{}' END", AFTER_HOURS_SLOT));
        sql
    }
}
