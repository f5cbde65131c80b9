// ==========================================
// 展会访客分析导出 - 引擎层
// ==========================================
// 职责: 展会日 -> 日历日期的解析规则
// 红线: Engine 不拼 SQL
// ==========================================

pub mod day_resolver;

pub use day_resolver::DayResolver;
