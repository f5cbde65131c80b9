// ==========================================
// 人流类聚合查询
// ==========================================

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::date_param;
use crate::domain::rows::{AvgBuildingsPerVisitor, BusiestBuilding, SlotFlow, Transition};
use crate::domain::types::SlotPlan;
use crate::repository::sql_builder::SqlQueryBuilder;

/// 时段入场/离场次数: (slot, entries, exits)
///
/// 入场按 entry_time 归段，离场按 exit_time 归段
pub fn slot_flow(conn: &Connection, date: NaiveDate, slots: &SlotPlan) -> rusqlite::Result<Vec<SlotFlow>> {
    let sql = format!(
        r#"SELECT slot, SUM(entry_count) AS entries, SUM(exit_count) AS exits FROM (
               SELECT {entry_case} AS slot, 1 AS entry_count, 0 AS exit_count
               FROM entry_exit_log
               WHERE date(entry_time) = ?1
               UNION ALL
               SELECT {exit_case} AS slot, 0 AS entry_count, 1 AS exit_count
               FROM entry_exit_log
               WHERE exit_time IS NOT NULL AND date(exit_time) = ?1
           )
           GROUP BY slot"#,
        entry_case = slots.sql_case("entry_time"),
        exit_case = slots.sql_case("exit_time"),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(SlotFlow {
                slot: row.get(0)?,
                entries: row.get(1)?,
                exits: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by_key(|r| slots.position(&r.slot));
    Ok(rows)
}

/// 楼栋迁移 Top N: (from_building, to_building, transitions)
///
/// 同一 tag 按入场时间排序后相邻两条记录构成一次迁移，同楼栋重复入场不计
pub fn transitions(conn: &Connection, date: NaiveDate, limit: usize) -> rusqlite::Result<Vec<Transition>> {
    let sql = SqlQueryBuilder::new(
        r#"SELECT from_building, to_building, COUNT(*) AS transitions FROM (
               SELECT building_id AS to_building,
                      LAG(building_id) OVER (
                          PARTITION BY tag_id ORDER BY entry_time ASC, log_id ASC
                      ) AS from_building
               FROM entry_exit_log
               WHERE date(entry_time) = ?1
           )"#,
    )
    .where_clause("from_building IS NOT NULL")
    .where_clause("from_building <> to_building")
    .group_by("from_building, to_building")
    .order_by("transitions DESC, from_building ASC, to_building ASC")
    .limit_param("?2")
    .build();

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date), limit], |row| {
            Ok(Transition {
                from_building: row.get(0)?,
                to_building: row.get(1)?,
                transitions: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 最繁忙楼栋 Top N: (dept_name, building_id, entries)
pub fn busiest_buildings(
    conn: &Connection,
    date: NaiveDate,
    limit: usize,
) -> rusqlite::Result<Vec<BusiestBuilding>> {
    let sql = SqlQueryBuilder::new(
        r#"SELECT b.dept_name, b.building_id, COUNT(*) AS entries
           FROM entry_exit_log e
           JOIN building b ON b.building_id = e.building_id"#,
    )
    .where_clause("date(e.entry_time) = ?1")
    .group_by("b.dept_name, b.building_id")
    .order_by("entries DESC, b.building_id ASC")
    .limit_param("?2")
    .build();

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date), limit], |row| {
            Ok(BusiestBuilding {
                dept_name: row.get(0)?,
                building_id: row.get(1)?,
                entries: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 人均到访楼栋数；当日无入场时返回空集合
pub fn avg_buildings_per_visitor(
    conn: &Connection,
    date: NaiveDate,
) -> rusqlite::Result<Vec<AvgBuildingsPerVisitor>> {
    let avg: Option<f64> = conn.query_row(
        r#"SELECT ROUND(AVG(cnt), 2) FROM (
               SELECT tag_id, COUNT(DISTINCT building_id) AS cnt
               FROM entry_exit_log
               WHERE date(entry_time) = ?1
               GROUP BY tag_id
           )"#,
        params![date_param(date)],
        |row| row.get(0),
    )?;

    Ok(avg
        .map(|avg_buildings| vec![AvgBuildingsPerVisitor { avg_buildings }])
        .unwrap_or_default())
}
