// ==========================================
// 展会访客分析导出 - 聚合查询行结构
// ==========================================
// 职责: 每个聚合查询一个显式字段的行类型，统一收敛到 RowSet 标签枚举
// 约束: 行数据只读，由单次报表组装消费后丢弃
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 出勤类 (Attendance)
// ==========================================

/// 按楼栋统计的入场次数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingVisits {
    pub dept_name: String,
    pub building_id: String,
    pub visits: i64,
}

/// 按楼栋统计的独立访客数（按 tag 去重）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueVisitors {
    pub dept_name: String,
    pub building_id: String,
    pub unique_visitors: i64,
}

/// 按楼栋统计的平均停留时长（分钟）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvgDwell {
    pub dept_name: String,
    pub building_id: String,
    pub avg_minutes: f64,
}

/// 全场按小时的入场直方图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntries {
    pub hour: u32,
    pub entries: i64,
}

/// 每个楼栋入场最多的小时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingPeakHour {
    pub building_id: String,
    pub hour: u32,
    pub entries: i64,
}

/// 按时段统计的入场次数（slot 为时段键，如 "10-13"）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotVisits {
    pub slot: String,
    pub visits: i64,
}

/// 按楼栋统计的离场次数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingExits {
    pub building_id: String,
    pub exits: i64,
}

/// 按区域统计的入场次数（区域为楼栋编号首字母）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneVisits {
    pub zone: String,
    pub visits: i64,
}

/// 当日多次入场的访客
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatVisitor {
    pub tag_id: String,
    pub visits: i64,
}

// ==========================================
// 人流类 (Movement)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotFlow {
    pub slot: String,
    pub entries: i64,
    pub exits: i64,
}

/// 同一访客相邻两次入场之间的楼栋迁移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_building: String,
    pub to_building: String,
    pub transitions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusiestBuilding {
    pub dept_name: String,
    pub building_id: String,
    pub entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvgBuildingsPerVisitor {
    pub avg_buildings: f64,
}

// ==========================================
// 安全与异常类 (Security / Exception)
// ==========================================

/// 楼栋表中不存在的楼栋入场记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanEntry {
    pub tag_id: String,
    pub building_id: String,
    pub entry_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overstay {
    pub tag_id: String,
    pub building_id: String,
    pub entry_time: String,
    pub exit_time: String,
    pub minutes: f64,
}

/// 未记录离场的会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSession {
    pub tag_id: String,
    pub building_id: String,
    pub entry_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfterHours {
    pub building_name: BuildingName,
    pub building_id: String,
    pub entries: i64,
}

/// 单个楼栋在单个时段内入场数超过阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionBurst {
    pub building_id: String,
    pub slot: String,
    pub entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub building_id: String,
    pub dept_name: String,
}

// ==========================================
// 活动类 (Event Summary)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOverview {
    pub total_events: i64,
    pub avg_duration_minutes: Option<f64>,
    pub first_event: Option<String>,
    pub last_event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEvents {
    pub hour: u32,
    pub events: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category_name: String,
    pub event_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: Option<String>,
    pub event_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerCount {
    pub speaker_name: String,
    pub event_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpeakerCount {
    pub location: Option<String>,
    pub speaker_name: String,
    pub event_count: i64,
}

/// 活动地点为空时的展示值
pub const UNSPECIFIED_LOCATION: &str = "Unspecified Location";

pub fn location_display(location: &Option<String>) -> &str {
    match location {
        Some(name) if !name.trim().is_empty() => name.as_str(),
        _ => UNSPECIFIED_LOCATION,
    }
}

// ==========================================
// 楼栋名称查找 (Found / NotFound)
// ==========================================

/// 楼栋不存在时的展示值
pub const UNKNOWN_BUILDING: &str = "Unknown Building";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingName {
    Found(String),
    NotFound,
}

impl BuildingName {
    pub fn display(&self) -> &str {
        match self {
            BuildingName::Found(name) => name.as_str(),
            BuildingName::NotFound => UNKNOWN_BUILDING,
        }
    }
}

impl From<Option<String>> for BuildingName {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.trim().is_empty() => BuildingName::Found(name),
            _ => BuildingName::NotFound,
        }
    }
}

/// 楼栋编号 -> 部门名称
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingLookup {
    names: HashMap<String, String>,
}

impl BuildingLookup {
    pub fn from_records(records: Vec<BuildingRecord>) -> Self {
        let names = records
            .into_iter()
            .map(|r| (r.building_id, r.dept_name))
            .collect();
        Self { names }
    }

    pub fn insert(&mut self, building_id: impl Into<String>, dept_name: impl Into<String>) {
        self.names.insert(building_id.into(), dept_name.into());
    }

    pub fn get(&self, building_id: &str) -> BuildingName {
        BuildingName::from(self.names.get(building_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ==========================================
// RowSet - 聚合查询结果标签枚举
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub enum RowSet {
    BuildingVisits(Vec<BuildingVisits>),
    UniqueVisitors(Vec<UniqueVisitors>),
    AvgDwell(Vec<AvgDwell>),
    HourlyEntries(Vec<HourlyEntries>),
    BuildingPeakHours(Vec<BuildingPeakHour>),
    SlotVisits(Vec<SlotVisits>),
    BuildingExits(Vec<BuildingExits>),
    ZoneVisits(Vec<ZoneVisits>),
    RepeatVisitors(Vec<RepeatVisitor>),
    SlotFlow(Vec<SlotFlow>),
    Transitions(Vec<Transition>),
    BusiestBuildings(Vec<BusiestBuilding>),
    AvgBuildingsPerVisitor(Vec<AvgBuildingsPerVisitor>),
    OrphanEntries(Vec<OrphanEntry>),
    Overstays(Vec<Overstay>),
    OpenSessions(Vec<OpenSession>),
    AfterHours(Vec<AfterHours>),
    CongestionBursts(Vec<CongestionBurst>),
    Buildings(Vec<BuildingRecord>),
    EventOverview(Vec<EventOverview>),
    HourlyEvents(Vec<HourlyEvents>),
    EventCategories(Vec<CategoryCount>),
    EventLocations(Vec<LocationCount>),
    EventSpeakers(Vec<SpeakerCount>),
    EventLocationSpeakers(Vec<LocationSpeakerCount>),
}

impl RowSet {
    pub fn len(&self) -> usize {
        match self {
            RowSet::BuildingVisits(r) => r.len(),
            RowSet::UniqueVisitors(r) => r.len(),
            RowSet::AvgDwell(r) => r.len(),
            RowSet::HourlyEntries(r) => r.len(),
            RowSet::BuildingPeakHours(r) => r.len(),
            RowSet::SlotVisits(r) => r.len(),
            RowSet::BuildingExits(r) => r.len(),
            RowSet::ZoneVisits(r) => r.len(),
            RowSet::RepeatVisitors(r) => r.len(),
            RowSet::SlotFlow(r) => r.len(),
            RowSet::Transitions(r) => r.len(),
            RowSet::BusiestBuildings(r) => r.len(),
            RowSet::AvgBuildingsPerVisitor(r) => r.len(),
            RowSet::OrphanEntries(r) => r.len(),
            RowSet::Overstays(r) => r.len(),
            RowSet::OpenSessions(r) => r.len(),
            RowSet::AfterHours(r) => r.len(),
            RowSet::CongestionBursts(r) => r.len(),
            RowSet::Buildings(r) => r.len(),
            RowSet::EventOverview(r) => r.len(),
            RowSet::HourlyEvents(r) => r.len(),
            RowSet::EventCategories(r) => r.len(),
            RowSet::EventLocations(r) => r.len(),
            RowSet::EventSpeakers(r) => r.len(),
            RowSet::EventLocationSpeakers(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 变体名称（日志/错误信息用）
    pub fn variant_name(&self) -> &'static str {
        match self {
            RowSet::BuildingVisits(_) => "building_visits",
            RowSet::UniqueVisitors(_) => "unique_visitors",
            RowSet::AvgDwell(_) => "avg_dwell",
            RowSet::HourlyEntries(_) => "hourly_entries",
            RowSet::BuildingPeakHours(_) => "building_peak_hours",
            RowSet::SlotVisits(_) => "slot_visits",
            RowSet::BuildingExits(_) => "building_exits",
            RowSet::ZoneVisits(_) => "zone_visits",
            RowSet::RepeatVisitors(_) => "repeat_visitors",
            RowSet::SlotFlow(_) => "slot_flow",
            RowSet::Transitions(_) => "transitions",
            RowSet::BusiestBuildings(_) => "busiest_buildings",
            RowSet::AvgBuildingsPerVisitor(_) => "avg_buildings_per_visitor",
            RowSet::OrphanEntries(_) => "orphan_entries",
            RowSet::Overstays(_) => "overstays",
            RowSet::OpenSessions(_) => "open_sessions",
            RowSet::AfterHours(_) => "after_hours",
            RowSet::CongestionBursts(_) => "congestion_bursts",
            RowSet::Buildings(_) => "buildings",
            RowSet::EventOverview(_) => "event_overview",
            RowSet::HourlyEvents(_) => "hourly_events",
            RowSet::EventCategories(_) => "event_categories",
            RowSet::EventLocations(_) => "event_locations",
            RowSet::EventSpeakers(_) => "event_speakers",
            RowSet::EventLocationSpeakers(_) => "event_location_speakers",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_name_fallback() {
        assert_eq!(BuildingName::from(Some("Science".to_string())).display(), "Science");
        assert_eq!(BuildingName::from(None).display(), UNKNOWN_BUILDING);
        assert_eq!(BuildingName::from(Some("  ".to_string())), BuildingName::NotFound);
    }

    #[test]
    fn test_building_lookup() {
        let lookup = BuildingLookup::from_records(vec![BuildingRecord {
            building_id: "B1".to_string(),
            dept_name: "Admin".to_string(),
        }]);
        assert_eq!(lookup.get("B1"), BuildingName::Found("Admin".to_string()));
        assert_eq!(lookup.get("B9"), BuildingName::NotFound);
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(location_display(&Some("Hall A".to_string())), "Hall A");
        assert_eq!(location_display(&None), UNSPECIFIED_LOCATION);
    }

    #[test]
    fn test_rowset_len_and_name() {
        let rows = RowSet::ZoneVisits(vec![ZoneVisits {
            zone: "B".to_string(),
            visits: 10,
        }]);
        assert_eq!(rows.len(), 1);
        assert!(!rows.is_empty());
        assert_eq!(rows.variant_name(), "zone_visits");
        assert!(RowSet::Transitions(vec![]).is_empty());
    }
}
