// ==========================================
// 安全与异常类聚合查询
// ==========================================

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};

use super::{date_param, minutes_between};
use crate::domain::rows::{
    AfterHours, BuildingName, BuildingRecord, CongestionBurst, OpenSession, OrphanEntry, Overstay,
};
use crate::domain::types::{SlotPlan, AFTER_HOURS_SLOT};
use crate::repository::sql_builder::{numbered_placeholders, SqlQueryBuilder};

/// 楼栋表中无对应记录的入场: (tag_id, building_id, entry_time)，最新在前
pub fn orphan_entries(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<OrphanEntry>> {
    let sql = SqlQueryBuilder::new("SELECT e.tag_id, e.building_id, e.entry_time FROM entry_exit_log e")
        .where_clause("date(e.entry_time) = ?1")
        .where_clause("NOT EXISTS (SELECT 1 FROM building b WHERE b.building_id = e.building_id)")
        .order_by("e.entry_time DESC, e.log_id DESC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(OrphanEntry {
                tag_id: row.get(0)?,
                building_id: row.get(1)?,
                entry_time: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 停留超时: 停留分钟数严格大于阈值
pub fn overstays(
    conn: &Connection,
    date: NaiveDate,
    threshold_minutes: u32,
) -> rusqlite::Result<Vec<Overstay>> {
    let minutes = minutes_between("entry_time", "exit_time");
    let select = format!(
        "SELECT tag_id, building_id, entry_time, exit_time, ROUND({m}, 1) AS minutes FROM entry_exit_log",
        m = minutes
    );
    let over = format!("{} > ?2", minutes);
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(entry_time) = ?1")
        .where_clause("exit_time IS NOT NULL")
        .where_clause(&over)
        .order_by("minutes DESC, tag_id ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date), f64::from(threshold_minutes)], |row| {
            Ok(Overstay {
                tag_id: row.get(0)?,
                building_id: row.get(1)?,
                entry_time: row.get(2)?,
                exit_time: row.get(3)?,
                minutes: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 未记录离场的会话: (tag_id, building_id, entry_time)
pub fn open_sessions(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<OpenSession>> {
    let sql = SqlQueryBuilder::new("SELECT tag_id, building_id, entry_time FROM entry_exit_log")
        .where_clause("date(entry_time) = ?1")
        .where_clause("exit_time IS NULL")
        .order_by("entry_time ASC, log_id ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(OpenSession {
                tag_id: row.get(0)?,
                building_id: row.get(1)?,
                entry_time: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 开放时段外的入场（按楼栋）；楼栋不存在时名称为 NotFound
pub fn after_hours(conn: &Connection, date: NaiveDate, slots: &SlotPlan) -> rusqlite::Result<Vec<AfterHours>> {
    let outside = format!("({}) = '{}'", slots.sql_case("e.entry_time"), AFTER_HOURS_SLOT);
    let sql = SqlQueryBuilder::new(
        r#"SELECT b.dept_name, e.building_id, COUNT(*) AS entries
           FROM entry_exit_log e
           LEFT JOIN building b ON b.building_id = e.building_id"#,
    )
    .where_clause("date(e.entry_time) = ?1")
    .where_clause(&outside)
    .group_by("e.building_id, b.dept_name")
    .order_by("entries DESC, e.building_id ASC")
    .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            let dept_name: Option<String> = row.get(0)?;
            Ok(AfterHours {
                building_name: BuildingName::from(dept_name),
                building_id: row.get(1)?,
                entries: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 拥堵: 单楼栋单时段入场数严格大于阈值
pub fn congestion_bursts(
    conn: &Connection,
    date: NaiveDate,
    slots: &SlotPlan,
    threshold: u32,
) -> rusqlite::Result<Vec<CongestionBurst>> {
    let select = format!(
        "SELECT building_id, {} AS slot, COUNT(*) AS entries FROM entry_exit_log",
        slots.sql_case("entry_time")
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(entry_time) = ?1")
        .group_by("building_id, slot")
        .having("COUNT(*) > ?2")
        .order_by("entries DESC, building_id ASC, slot ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date), i64::from(threshold)], |row| {
            Ok(CongestionBurst {
                building_id: row.get(0)?,
                slot: row.get(1)?,
                entries: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 按编号批量查询楼栋
pub fn buildings(conn: &Connection, building_ids: &[String]) -> rusqlite::Result<Vec<BuildingRecord>> {
    if building_ids.is_empty() {
        return Ok(Vec::new());
    }

    let filter = format!("building_id IN ({})", numbered_placeholders(1, building_ids.len()));
    let sql = SqlQueryBuilder::new("SELECT building_id, dept_name FROM building")
        .where_clause(&filter)
        .order_by("building_id ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(building_ids.iter()), |row| {
            Ok(BuildingRecord {
                building_id: row.get(0)?,
                dept_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
