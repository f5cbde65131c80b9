// ==========================================
// 展会访客分析导出 - 查询执行器接口
// ==========================================
// 职责: 定义聚合查询意图 (AggregateQuery) 与执行能力 (QueryExecutor)
// 约束: 执行器由基础设施层注入，连接/池的生命周期不归报表核心管理
// ==========================================

use chrono::NaiveDate;

use crate::domain::rows::RowSet;
use crate::domain::types::SlotPlan;
use crate::repository::error::RepositoryResult;

/// 聚合查询意图
///
/// 每个变体对应一条固定 SQL；返回的 RowSet 变体与查询一一对应
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateQuery {
    // ===== 出勤 =====
    BuildingVisits { date: NaiveDate },
    UniqueVisitors { date: NaiveDate },
    AvgDwell { date: NaiveDate },
    HourlyEntries { date: NaiveDate },
    BuildingPeakHours { date: NaiveDate },
    SlotVisits { date: NaiveDate, slots: SlotPlan },
    BuildingExits { date: NaiveDate },
    ZoneVisits { date: NaiveDate },
    RepeatVisitors { date: NaiveDate, limit: usize },

    // ===== 人流 =====
    SlotFlow { date: NaiveDate, slots: SlotPlan },
    Transitions { date: NaiveDate, limit: usize },
    BusiestBuildings { date: NaiveDate, limit: usize },
    AvgBuildingsPerVisitor { date: NaiveDate },

    // ===== 安全与异常 =====
    OrphanEntries { date: NaiveDate },
    Overstays { date: NaiveDate, threshold_minutes: u32 },
    OpenSessions { date: NaiveDate },
    AfterHours { date: NaiveDate, slots: SlotPlan },
    CongestionBursts { date: NaiveDate, slots: SlotPlan, threshold: u32 },
    Buildings { building_ids: Vec<String> },

    // ===== 活动 =====
    /// 闭区间 [from, to]，用于当日与开展至今两个窗口
    EventOverview { from: NaiveDate, to: NaiveDate },
    HourlyEvents { date: NaiveDate },
    EventCategories { date: NaiveDate },
    EventLocations { date: NaiveDate },
    EventSpeakers { date: NaiveDate },
    EventLocationSpeakers { date: NaiveDate },
}

impl AggregateQuery {
    /// 查询名称（日志字段）
    pub fn name(&self) -> &'static str {
        match self {
            AggregateQuery::BuildingVisits { .. } => "building_visits",
            AggregateQuery::UniqueVisitors { .. } => "unique_visitors",
            AggregateQuery::AvgDwell { .. } => "avg_dwell",
            AggregateQuery::HourlyEntries { .. } => "hourly_entries",
            AggregateQuery::BuildingPeakHours { .. } => "building_peak_hours",
            AggregateQuery::SlotVisits { .. } => "slot_visits",
            AggregateQuery::BuildingExits { .. } => "building_exits",
            AggregateQuery::ZoneVisits { .. } => "zone_visits",
            AggregateQuery::RepeatVisitors { .. } => "repeat_visitors",
            AggregateQuery::SlotFlow { .. } => "slot_flow",
            AggregateQuery::Transitions { .. } => "transitions",
            AggregateQuery::BusiestBuildings { .. } => "busiest_buildings",
            AggregateQuery::AvgBuildingsPerVisitor { .. } => "avg_buildings_per_visitor",
            AggregateQuery::OrphanEntries { .. } => "orphan_entries",
            AggregateQuery::Overstays { .. } => "overstays",
            AggregateQuery::OpenSessions { .. } => "open_sessions",
            AggregateQuery::AfterHours { .. } => "after_hours",
            AggregateQuery::CongestionBursts { .. } => "congestion_bursts",
            AggregateQuery::Buildings { .. } => "buildings",
            AggregateQuery::EventOverview { .. } => "event_overview",
            AggregateQuery::HourlyEvents { .. } => "hourly_events",
            AggregateQuery::EventCategories { .. } => "event_categories",
            AggregateQuery::EventLocations { .. } => "event_locations",
            AggregateQuery::EventSpeakers { .. } => "event_speakers",
            AggregateQuery::EventLocationSpeakers { .. } => "event_location_speakers",
        }
    }
}

/// 查询执行能力
///
/// 实现方负责连接获取超时：获取失败必须返回错误，不得无限阻塞
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, query: &AggregateQuery) -> RepositoryResult<RowSet>;
}
