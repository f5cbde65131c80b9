// ==========================================
// 展会访客分析导出 - SQLite 查询执行器
// ==========================================
// 职责: 持有单个 SQLite 连接，把 AggregateQuery 分派到固定 SQL
// 约束: 连接获取有上限等待时间，超时返回 ConnectionTimeout
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::db::{open_sqlite_connection, DEFAULT_BUSY_TIMEOUT_MS};
use crate::domain::rows::RowSet;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::executor::{AggregateQuery, QueryExecutor};
use crate::repository::queries::{attendance, events, movement, security};

/// 连接获取轮询间隔
const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct SqliteQueryExecutor {
    conn: Arc<Mutex<Connection>>,
    acquire_timeout: Duration,
}

impl SqliteQueryExecutor {
    pub fn new(conn: Arc<Mutex<Connection>>, acquire_timeout: Duration) -> Self {
        Self {
            conn,
            acquire_timeout,
        }
    }

    /// 打开数据库文件并创建执行器
    pub fn open(db_path: &str, acquire_timeout: Duration) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::new(Arc::new(Mutex::new(conn)), acquire_timeout))
    }

    /// 使用默认等待时间创建执行器
    pub fn with_default_timeout(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(conn, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 在截止时间内获取连接
    fn acquire(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        let started = Instant::now();
        loop {
            match self.conn.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(e)) => {
                    return Err(RepositoryError::LockError(e.to_string()));
                }
                Err(TryLockError::WouldBlock) => {
                    if started.elapsed() >= self.acquire_timeout {
                        let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                        tracing::warn!(waited_ms, "数据库连接获取超时");
                        return Err(RepositoryError::ConnectionTimeout { waited_ms });
                    }
                    thread::sleep(ACQUIRE_POLL_INTERVAL);
                }
            }
        }
    }
}

impl QueryExecutor for SqliteQueryExecutor {
    fn execute(&self, query: &AggregateQuery) -> RepositoryResult<RowSet> {
        let conn = self.acquire()?;
        let name = query.name();
        let wrap = |e: rusqlite::Error| RepositoryError::query(name, e);

        let rows = match query {
            AggregateQuery::BuildingVisits { date } => {
                RowSet::BuildingVisits(attendance::building_visits(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::UniqueVisitors { date } => {
                RowSet::UniqueVisitors(attendance::unique_visitors(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::AvgDwell { date } => {
                RowSet::AvgDwell(attendance::avg_dwell(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::HourlyEntries { date } => {
                RowSet::HourlyEntries(attendance::hourly_entries(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::BuildingPeakHours { date } => RowSet::BuildingPeakHours(
                attendance::building_peak_hours(&conn, *date).map_err(wrap)?,
            ),
            AggregateQuery::SlotVisits { date, slots } => {
                RowSet::SlotVisits(attendance::slot_visits(&conn, *date, slots).map_err(wrap)?)
            }
            AggregateQuery::BuildingExits { date } => {
                RowSet::BuildingExits(attendance::building_exits(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::ZoneVisits { date } => {
                RowSet::ZoneVisits(attendance::zone_visits(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::RepeatVisitors { date, limit } => RowSet::RepeatVisitors(
                attendance::repeat_visitors(&conn, *date, *limit).map_err(wrap)?,
            ),
            AggregateQuery::SlotFlow { date, slots } => {
                RowSet::SlotFlow(movement::slot_flow(&conn, *date, slots).map_err(wrap)?)
            }
            AggregateQuery::Transitions { date, limit } => {
                RowSet::Transitions(movement::transitions(&conn, *date, *limit).map_err(wrap)?)
            }
            AggregateQuery::BusiestBuildings { date, limit } => RowSet::BusiestBuildings(
                movement::busiest_buildings(&conn, *date, *limit).map_err(wrap)?,
            ),
            AggregateQuery::AvgBuildingsPerVisitor { date } => RowSet::AvgBuildingsPerVisitor(
                movement::avg_buildings_per_visitor(&conn, *date).map_err(wrap)?,
            ),
            AggregateQuery::OrphanEntries { date } => {
                RowSet::OrphanEntries(security::orphan_entries(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::Overstays {
                date,
                threshold_minutes,
            } => RowSet::Overstays(
                security::overstays(&conn, *date, *threshold_minutes).map_err(wrap)?,
            ),
            AggregateQuery::OpenSessions { date } => {
                RowSet::OpenSessions(security::open_sessions(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::AfterHours { date, slots } => {
                RowSet::AfterHours(security::after_hours(&conn, *date, slots).map_err(wrap)?)
            }
            AggregateQuery::CongestionBursts {
                date,
                slots,
                threshold,
            } => RowSet::CongestionBursts(
                security::congestion_bursts(&conn, *date, slots, *threshold).map_err(wrap)?,
            ),
            AggregateQuery::Buildings { building_ids } => {
                RowSet::Buildings(security::buildings(&conn, building_ids).map_err(wrap)?)
            }
            AggregateQuery::EventOverview { from, to } => {
                RowSet::EventOverview(events::event_overview(&conn, *from, *to).map_err(wrap)?)
            }
            AggregateQuery::HourlyEvents { date } => {
                RowSet::HourlyEvents(events::hourly_events(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::EventCategories { date } => {
                RowSet::EventCategories(events::event_categories(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::EventLocations { date } => {
                RowSet::EventLocations(events::event_locations(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::EventSpeakers { date } => {
                RowSet::EventSpeakers(events::event_speakers(&conn, *date).map_err(wrap)?)
            }
            AggregateQuery::EventLocationSpeakers { date } => RowSet::EventLocationSpeakers(
                events::event_location_speakers(&conn, *date).map_err(wrap)?,
            ),
        };

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::NaiveDate;

    fn day1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 28).unwrap()
    }

    fn executor_with_rows() -> SqliteQueryExecutor {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO building (building_id, dept_name) VALUES ('B1', 'Engineering');
            INSERT INTO entry_exit_log (tag_id, building_id, entry_time, exit_time)
            VALUES ('T1', 'B1', '2025-10-28 10:15:00', '2025-10-28 10:45:00'),
                   ('T1', 'B1', '2025-10-28 14:00:00', NULL);
            "#,
        )
        .unwrap();
        SqliteQueryExecutor::new(Arc::new(Mutex::new(conn)), Duration::from_millis(50))
    }

    #[test]
    fn test_execute_dispatches_to_matching_rowset() {
        let executor = executor_with_rows();
        let rows = executor
            .execute(&AggregateQuery::BuildingVisits { date: day1() })
            .unwrap();
        match rows {
            RowSet::BuildingVisits(v) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].visits, 2);
            }
            other => panic!("unexpected rowset: {}", other.variant_name()),
        }
    }

    #[test]
    fn test_execute_空结果() {
        let executor = executor_with_rows();
        let other_day = NaiveDate::from_ymd_opt(2025, 10, 30).unwrap();
        let rows = executor
            .execute(&AggregateQuery::OpenSessions { date: other_day })
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_acquire_timeout_when_connection_held() {
        let executor = executor_with_rows();
        let conn = executor.connection();
        let _held = conn.lock().unwrap();

        let err = executor
            .execute(&AggregateQuery::ZoneVisits { date: day1() })
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionTimeout { .. }));
    }
}
