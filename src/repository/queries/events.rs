// ==========================================
// 活动类聚合查询
// ==========================================

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::{date_param, hour_expr, minutes_between, to_hour};
use crate::domain::rows::{
    CategoryCount, EventOverview, HourlyEvents, LocationCount, LocationSpeakerCount, SpeakerCount,
};
use crate::repository::sql_builder::SqlQueryBuilder;

/// 地点分组键：NULL 与空白地点归为同一组（NULL）
const LOCATION_KEY: &str = "NULLIF(TRIM(e.location), '')";

/// 活动概览（闭区间 [from, to]）；区间内无活动时返回空集合
pub fn event_overview(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> rusqlite::Result<Vec<EventOverview>> {
    let select = format!(
        r#"SELECT COUNT(*) AS total_events,
                  ROUND(AVG({duration}), 1) AS avg_duration,
                  MIN(start_time) AS first_event,
                  MAX(COALESCE(end_time, start_time)) AS last_event
           FROM events"#,
        duration = minutes_between("start_time", "end_time")
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(start_time) BETWEEN ?1 AND ?2")
        .build();

    let overview = conn.query_row(&sql, params![date_param(from), date_param(to)], |row| {
        Ok(EventOverview {
            total_events: row.get(0)?,
            avg_duration_minutes: row.get(1)?,
            first_event: row.get(2)?,
            last_event: row.get(3)?,
        })
    })?;

    if overview.total_events == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![overview])
}

/// 按小时的活动数: (hour, events)
pub fn hourly_events(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<HourlyEvents>> {
    let select = format!(
        "SELECT {} AS hour, COUNT(*) AS events FROM events",
        hour_expr("start_time")
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(start_time) = ?1")
        .group_by("hour")
        .order_by("hour ASC")
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(HourlyEvents {
                hour: to_hour(row.get(0)?),
                events: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 按分类的活动数: (category_name, event_count)
pub fn event_categories(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<CategoryCount>> {
    let sql = SqlQueryBuilder::new(
        r#"SELECT c.category_name, COUNT(DISTINCT e.event_id) AS event_count
           FROM events e
           JOIN event_category c ON c.event_id = e.event_id"#,
    )
    .where_clause("date(e.start_time) = ?1")
    .group_by("c.category_name")
    .order_by("event_count DESC, c.category_name ASC")
    .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(CategoryCount {
                category_name: row.get(0)?,
                event_count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 按地点的活动数: (location, event_count)
pub fn event_locations(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<LocationCount>> {
    let select = format!("SELECT {} AS location, COUNT(*) AS event_count FROM events e", LOCATION_KEY);
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(e.start_time) = ?1")
        .group_by(LOCATION_KEY)
        .order_by(&format!("event_count DESC, {} ASC", LOCATION_KEY))
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(LocationCount {
                location: row.get(0)?,
                event_count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 按演讲者的活动数: (speaker_name, event_count)
pub fn event_speakers(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Vec<SpeakerCount>> {
    let sql = SqlQueryBuilder::new(
        r#"SELECT s.speaker_name, COUNT(DISTINCT e.event_id) AS event_count
           FROM events e
           JOIN event_speaker s ON s.event_id = e.event_id"#,
    )
    .where_clause("date(e.start_time) = ?1")
    .group_by("s.speaker_name")
    .order_by("event_count DESC, s.speaker_name ASC")
    .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(SpeakerCount {
                speaker_name: row.get(0)?,
                event_count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 按地点 + 演讲者的活动数: (location, speaker_name, event_count)
pub fn event_location_speakers(
    conn: &Connection,
    date: NaiveDate,
) -> rusqlite::Result<Vec<LocationSpeakerCount>> {
    let select = format!(
        r#"SELECT {} AS location, s.speaker_name, COUNT(DISTINCT e.event_id) AS event_count
           FROM events e
           JOIN event_speaker s ON s.event_id = e.event_id"#,
        LOCATION_KEY
    );
    let sql = SqlQueryBuilder::new(&select)
        .where_clause("date(e.start_time) = ?1")
        .group_by(&format!("{}, s.speaker_name", LOCATION_KEY))
        .order_by(&format!("{} ASC, event_count DESC, s.speaker_name ASC", LOCATION_KEY))
        .build();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date_param(date)], |row| {
            Ok(LocationSpeakerCount {
                location: row.get(0)?,
                speaker_name: row.get(1)?,
                event_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
