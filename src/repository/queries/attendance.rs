// ==========================================
// 出勤类聚合查询
// ==========================================

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::{date_param, hour_expr, minutes_between, to_hour};
use crate::domain::rows::{
    AvgDwell, BuildingExits, BuildingPeakHour, BuildingVisits, HourlyEntries, RepeatVisitor,
    SlotVisits, UniqueVisitors, ZoneVisits,
};
use crate::domain::types::SlotPlan;
use crate::repository::sql_builder::SqlQueryBuilder;

/// 楼栋入场次数: (dept_name, building_id, visits)
pub fn building_visits(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<BuildingVisits>> {
    let sql = SqlQueryBuilder::new(
        r#"SELECT b.dept_name, b.building_id, COUNT(*) AS visits
           FROM entry_exit_log e
           JOIN building b ON b.building_id = e.building_id"#,
    )
    .where_clause("date(e.entry_time) = ?1")
    .group_by("b.dept_name, b.building_id")
    .order_by("visits DESC, b.building_id ASC")
    .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(BuildingVisits {
                dept_name: row.get(0)?,
                building_id: row.get(1)?,
                visits: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 楼栋独立访客数: (dept_name, building_id, unique_visitors)
pub fn unique_visitors(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<UniqueVisitors>> {
    let sql = SqlQueryBuilder::new(
        r#"SELECT b.dept_name, b.building_id, COUNT(DISTINCT e.tag_id) AS unique_visitors
           FROM entry_exit_log e
           JOIN building b ON b.building_id = e.building_id"#,
    )
    .where_clause("date(e.entry_time) = ?1")
    .group_by("b.dept_name, b.building_id")
    .order_by("unique_visitors DESC, b.building_id ASC")
    .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(UniqueVisitors {
                dept_name: row.get(0)?,
                building_id: row.get(1)?,
                unique_visitors: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 楼栋平均停留分钟数（仅统计离场时间可解析的记录）: (dept_name, building_id, avg_minutes)
pub fn avg_dwell(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<AvgDwell>> {
    let minutes = minutes_between("e.entry_time", "e.exit_time");
    let select = format!(
        r#"SELECT b.dept_name, b.building_id, ROUND(AVG({}), 2) AS avg_minutes
           FROM entry_exit_log e
           JOIN building b ON b.building_id = e.building_id"#,
        minutes
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(e.entry_time) = ?1")
        .where_clause("julianday(e.exit_time) IS NOT NULL")
        .group_by("b.dept_name, b.building_id")
        .order_by("b.building_id ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(AvgDwell {
                dept_name: row.get(0)?,
                building_id: row.get(1)?,
                avg_minutes: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 全场小时入场直方图: (hour, entries)
pub fn hourly_entries(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<HourlyEntries>> {
    let select = format!(
        "SELECT {} AS hour, COUNT(*) AS entries FROM entry_exit_log",
        hour_expr("entry_time")
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(entry_time) = ?1")
        .group_by("hour")
        .order_by("hour ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(HourlyEntries {
                hour: to_hour(row.get(0)?),
                entries: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 各楼栋入场高峰小时: (building_id, hour, entries)
///
/// 同票时取较早的小时
pub fn building_peak_hours(
    conn: &Connection,
    date: NaiveDate,
) -> rusqlite::Result<Vec<BuildingPeakHour>> {
    let hour = hour_expr("entry_time");
    let sql = format!(
        r#"SELECT building_id, hour, entries FROM (
               SELECT building_id,
                      {hour} AS hour,
                      COUNT(*) AS entries,
                      ROW_NUMBER() OVER (
                          PARTITION BY building_id
                          ORDER BY COUNT(*) DESC, {hour} ASC
                      ) AS rn
               FROM entry_exit_log
               WHERE date(entry_time) = ?1
               GROUP BY building_id, {hour}
           )
           WHERE rn = 1
           ORDER BY building_id ASC"#,
        hour = hour
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(BuildingPeakHour {
                building_id: row.get(0)?,
                hour: to_hour(row.get(1)?),
                entries: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 时段入场次数: (slot, visits)，按时段方案顺序排列，after-hours 在最后
pub fn slot_visits(
    conn: &Connection,
    date: NaiveDate,
    slots: &SlotPlan,
) -> rusqlite::Result<Vec<SlotVisits>> {
    let select = format!(
        "SELECT {} AS slot, COUNT(*) AS visits FROM entry_exit_log",
        slots.sql_case("entry_time")
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(entry_time) = ?1")
        .group_by("slot")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(SlotVisits {
                slot: row.get(0)?,
                visits: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by_key(|r| slots.position(&r.slot));
    Ok(rows)
}

/// 楼栋离场次数: (building_id, exits)
pub fn building_exits(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<BuildingExits>> {
    let sql = SqlQueryBuilder::new("SELECT building_id, COUNT(*) AS exits FROM entry_exit_log")
        .where_clause("exit_time IS NOT NULL")
        .where_clause("date(exit_time) = ?1")
        .group_by("building_id")
        .order_by("exits DESC, building_id ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(BuildingExits {
                building_id: row.get(0)?,
                exits: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 区域入场次数（区域 = 楼栋编号首字符）: (zone, visits)
pub fn zone_visits(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<ZoneVisits>> {
    let sql = SqlQueryBuilder::new(
        "SELECT substr(building_id, 1, 1) AS zone, COUNT(*) AS visits FROM entry_exit_log",
    )
    .where_clause("date(entry_time) = ?1")
    .group_by("zone")
    .order_by("visits DESC, zone ASC")
    .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(ZoneVisits {
                zone: row.get(0)?,
                visits: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 当日多次入场的访客: (tag_id, visits)
pub fn repeat_visitors(
    conn: &Connection,
    date: NaiveDate,
    limit: usize,
) -> rusqlite::Result<Vec<RepeatVisitor>> {
    let sql = SqlQueryBuilder::new("SELECT tag_id, COUNT(*) AS visits FROM entry_exit_log")
        .where_clause("date(entry_time) = ?1")
        .group_by("tag_id")
        .having("COUNT(*) > 1")
        .order_by("visits DESC, tag_id ASC")
        .limit_param("?2")
        .build();

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date), limit], |row| {
            Ok(RepeatVisitor {
                tag_id: row.get(0)?,
                visits: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
