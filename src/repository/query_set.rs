// ==========================================
// 展会访客分析导出 - 聚合查询集合
// ==========================================
// 职责: 以强类型方法暴露全部聚合查询，隐藏 RowSet 的拆包
// 约束: 查询集合不做业务判断，只负责参数组装与结果类型校验
// ==========================================

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::rows::*;
use crate::domain::types::{ResolvedDay, SlotPlan};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::executor::{AggregateQuery, QueryExecutor};

/// 把 RowSet 拆成期望的变体，类型不符时报错
macro_rules! expect_rows {
    ($rows:expr, $variant:ident) => {
        match $rows {
            RowSet::$variant(rows) => Ok(rows),
            other => Err(RepositoryError::UnexpectedRowSet {
                expected: stringify!($variant),
                actual: other.variant_name(),
            }),
        }
    };
}

#[derive(Clone)]
pub struct AggregateQuerySet {
    executor: Arc<dyn QueryExecutor>,
    slots: SlotPlan,
}

impl AggregateQuerySet {
    pub fn new(executor: Arc<dyn QueryExecutor>, slots: SlotPlan) -> Self {
        Self { executor, slots }
    }

    pub fn slots(&self) -> &SlotPlan {
        &self.slots
    }

    fn run(&self, query: AggregateQuery) -> RepositoryResult<RowSet> {
        let started = Instant::now();
        match self.executor.execute(&query) {
            Ok(rows) => {
                tracing::debug!(
                    query = query.name(),
                    rows = rows.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "聚合查询完成"
                );
                Ok(rows)
            }
            Err(e) => {
                tracing::error!(query = query.name(), error = %e, "聚合查询失败");
                Err(e)
            }
        }
    }

    // ===== 出勤 =====

    pub fn building_visits(&self, day: &ResolvedDay) -> RepositoryResult<Vec<BuildingVisits>> {
        expect_rows!(self.run(AggregateQuery::BuildingVisits { date: day.date })?, BuildingVisits)
    }

    pub fn unique_visitors(&self, day: &ResolvedDay) -> RepositoryResult<Vec<UniqueVisitors>> {
        expect_rows!(self.run(AggregateQuery::UniqueVisitors { date: day.date })?, UniqueVisitors)
    }

    pub fn avg_dwell(&self, day: &ResolvedDay) -> RepositoryResult<Vec<AvgDwell>> {
        expect_rows!(self.run(AggregateQuery::AvgDwell { date: day.date })?, AvgDwell)
    }

    pub fn hourly_entries(&self, day: &ResolvedDay) -> RepositoryResult<Vec<HourlyEntries>> {
        expect_rows!(self.run(AggregateQuery::HourlyEntries { date: day.date })?, HourlyEntries)
    }

    pub fn building_peak_hours(&self, day: &ResolvedDay) -> RepositoryResult<Vec<BuildingPeakHour>> {
        expect_rows!(
            self.run(AggregateQuery::BuildingPeakHours { date: day.date })?,
            BuildingPeakHours
        )
    }

    pub fn slot_visits(&self, day: &ResolvedDay) -> RepositoryResult<Vec<SlotVisits>> {
        expect_rows!(
            self.run(AggregateQuery::SlotVisits {
                date: day.date,
                slots: self.slots,
            })?,
            SlotVisits
        )
    }

    pub fn building_exits(&self, day: &ResolvedDay) -> RepositoryResult<Vec<BuildingExits>> {
        expect_rows!(self.run(AggregateQuery::BuildingExits { date: day.date })?, BuildingExits)
    }

    pub fn zone_visits(&self, day: &ResolvedDay) -> RepositoryResult<Vec<ZoneVisits>> {
        expect_rows!(self.run(AggregateQuery::ZoneVisits { date: day.date })?, ZoneVisits)
    }

    pub fn repeat_visitors(&self, day: &ResolvedDay, limit: usize) -> RepositoryResult<Vec<RepeatVisitor>> {
        expect_rows!(
            self.run(AggregateQuery::RepeatVisitors {
                date: day.date,
                limit,
            })?,
            RepeatVisitors
        )
    }

    // ===== 人流 =====

    pub fn slot_flow(&self, day: &ResolvedDay) -> RepositoryResult<Vec<SlotFlow>> {
        expect_rows!(
            self.run(AggregateQuery::SlotFlow {
                date: day.date,
                slots: self.slots,
            })?,
            SlotFlow
        )
    }

    pub fn transitions(&self, day: &ResolvedDay, limit: usize) -> RepositoryResult<Vec<Transition>> {
        expect_rows!(
            self.run(AggregateQuery::Transitions {
                date: day.date,
                limit,
            })?,
            Transitions
        )
    }

    pub fn busiest_buildings(&self, day: &ResolvedDay, limit: usize) -> RepositoryResult<Vec<BusiestBuilding>> {
        expect_rows!(
            self.run(AggregateQuery::BusiestBuildings {
                date: day.date,
                limit,
            })?,
            BusiestBuildings
        )
    }

    /// 人均到访楼栋数；无数据时为 None
    pub fn avg_buildings_per_visitor(&self, day: &ResolvedDay) -> RepositoryResult<Option<f64>> {
        let rows = expect_rows!(
            self.run(AggregateQuery::AvgBuildingsPerVisitor { date: day.date })?,
            AvgBuildingsPerVisitor
        )?;
        Ok(rows.first().map(|r| r.avg_buildings))
    }

    // ===== 安全与异常 =====

    pub fn orphan_entries(&self, day: &ResolvedDay) -> RepositoryResult<Vec<OrphanEntry>> {
        expect_rows!(self.run(AggregateQuery::OrphanEntries { date: day.date })?, OrphanEntries)
    }

    pub fn overstays(&self, day: &ResolvedDay, threshold_minutes: u32) -> RepositoryResult<Vec<Overstay>> {
        expect_rows!(
            self.run(AggregateQuery::Overstays {
                date: day.date,
                threshold_minutes,
            })?,
            Overstays
        )
    }

    pub fn open_sessions(&self, day: &ResolvedDay) -> RepositoryResult<Vec<OpenSession>> {
        expect_rows!(self.run(AggregateQuery::OpenSessions { date: day.date })?, OpenSessions)
    }

    pub fn after_hours(&self, day: &ResolvedDay) -> RepositoryResult<Vec<AfterHours>> {
        expect_rows!(
            self.run(AggregateQuery::AfterHours {
                date: day.date,
                slots: self.slots,
            })?,
            AfterHours
        )
    }

    pub fn congestion_bursts(&self, day: &ResolvedDay, threshold: u32) -> RepositoryResult<Vec<CongestionBurst>> {
        expect_rows!(
            self.run(AggregateQuery::CongestionBursts {
                date: day.date,
                slots: self.slots,
                threshold,
            })?,
            CongestionBursts
        )
    }

    /// 批量查询楼栋名称（去重后查询，空输入不访问数据库）
    pub fn lookup_buildings(&self, building_ids: &[String]) -> RepositoryResult<BuildingLookup> {
        let mut ids: Vec<String> = building_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(BuildingLookup::default());
        }

        let records = expect_rows!(
            self.run(AggregateQuery::Buildings { building_ids: ids })?,
            Buildings
        )?;
        Ok(BuildingLookup::from_records(records))
    }

    // ===== 活动 =====

    pub fn event_overview(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<Option<EventOverview>> {
        let rows = expect_rows!(self.run(AggregateQuery::EventOverview { from, to })?, EventOverview)?;
        Ok(rows.into_iter().next())
    }

    pub fn hourly_events(&self, day: &ResolvedDay) -> RepositoryResult<Vec<HourlyEvents>> {
        expect_rows!(self.run(AggregateQuery::HourlyEvents { date: day.date })?, HourlyEvents)
    }

    pub fn event_categories(&self, day: &ResolvedDay) -> RepositoryResult<Vec<CategoryCount>> {
        expect_rows!(self.run(AggregateQuery::EventCategories { date: day.date })?, EventCategories)
    }

    pub fn event_locations(&self, day: &ResolvedDay) -> RepositoryResult<Vec<LocationCount>> {
        expect_rows!(self.run(AggregateQuery::EventLocations { date: day.date })?, EventLocations)
    }

    pub fn event_speakers(&self, day: &ResolvedDay) -> RepositoryResult<Vec<SpeakerCount>> {
        expect_rows!(self.run(AggregateQuery::EventSpeakers { date: day.date })?, EventSpeakers)
    }

    pub fn event_location_speakers(&self, day: &ResolvedDay) -> RepositoryResult<Vec<LocationSpeakerCount>> {
        expect_rows!(
            self.run(AggregateQuery::EventLocationSpeakers { date: day.date })?,
            EventLocationSpeakers
        )
    }
}
