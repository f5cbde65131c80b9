// ==========================================
// 展会访客分析导出 - 聚合查询 SQL 目录
// ==========================================
// 职责: 每个聚合查询一条固定 SQL，按领域分文件
// 约束: 按日期过滤一律使用 date(<时间列>) = ?1；空结果返回空集合
// ==========================================
//
// 存储表结构（见 db::init_schema）:
// - building(building_id, dept_name)
// - entry_exit_log(log_id, tag_id, building_id, entry_time, exit_time)
// - events(event_id, event_name, location, start_time, end_time)
// - event_category(event_id, category_name)
// - event_speaker(event_id, speaker_name)

pub mod attendance;
pub mod events;
pub mod movement;
pub mod security;

use chrono::NaiveDate;

/// 日期参数统一为 YYYY-MM-DD 文本
pub(crate) fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 小时表达式（SQLite 时间文本 -> 整数小时）
pub(crate) fn hour_expr(column: &str) -> String {
    format!("CAST(strftime('%H', {}) AS INTEGER)", column)
}

/// 停留分钟数表达式
pub(crate) fn minutes_between(start: &str, end: &str) -> String {
    format!("((julianday({}) - julianday({})) * 1440.0)", end, start)
}

/// SQLite 整数 -> u32 小时（异常值按 0 处理）
pub(crate) fn to_hour(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
