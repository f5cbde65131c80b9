// ==========================================
// SQLite 聚合查询集成测试
// ==========================================
// 测试目标: 预置数据库上的聚合结果正确性（见 test_helpers::seed_store）
// ==========================================


use std::sync::Arc;

use exhibition_export::domain::rows::{BuildingName, UNKNOWN_BUILDING};
use exhibition_export::logging;
use exhibition_export::repository::{AggregateQuerySet, SqliteQueryExecutor};
use exhibition_export::SlotPlan;
use test_helpers::{day, seeded_memory_connection};

fn query_set_with(extra_sql: &str) -> AggregateQuerySet {
    let conn = seeded_memory_connection();
    conn.lock().unwrap().execute_batch(extra_sql).unwrap();
    AggregateQuerySet::new(
        Arc::new(SqliteQueryExecutor::with_default_timeout(conn)),
        SlotPlan::default(),
    )
}

fn query_set() -> AggregateQuerySet {
    logging::init_test();
    let executor = SqliteQueryExecutor::with_default_timeout(seeded_memory_connection());
    AggregateQuerySet::new(Arc::new(executor), SlotPlan::default())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.05
}

#[test]
fn test_attendance_aggregates() {
    let qs = query_set();
    let d = day(1);

    let visits = qs.building_visits(&d).unwrap();
    let summary: Vec<(&str, i64)> = visits.iter().map(|v| (v.building_id.as_str(), v.visits)).collect();
    assert_eq!(summary, vec![("B1", 3), ("B2", 2), ("C1", 1)]);

    let unique = qs.unique_visitors(&d).unwrap();
    assert_eq!(unique.iter().find(|u| u.building_id == "B1").unwrap().unique_visitors, 2);

    let dwell = qs.avg_dwell(&d).unwrap();
    assert_eq!(dwell.len(), 2, "C1 没有离场记录");
    assert!(close(dwell[0].avg_minutes, 130.0));
    assert!(close(dwell[1].avg_minutes, 30.0));

    let hourly: Vec<(u32, i64)> = qs
        .hourly_entries(&d)
        .unwrap()
        .iter()
        .map(|h| (h.hour, h.entries))
        .collect();
    assert_eq!(hourly, vec![(10, 2), (11, 1), (12, 1), (14, 2), (20, 1)]);

    let peaks = qs.building_peak_hours(&d).unwrap();
    let b1 = peaks.iter().find(|p| p.building_id == "B1").unwrap();
    assert_eq!((b1.hour, b1.entries), (10, 2));

    let exits = qs.building_exits(&d).unwrap();
    assert_eq!(exits.iter().find(|e| e.building_id == "B1").unwrap().exits, 3);

    let zones: Vec<(String, i64)> = qs
        .zone_visits(&d)
        .unwrap()
        .into_iter()
        .map(|z| (z.zone, z.visits))
        .collect();
    assert_eq!(
        zones,
        vec![("B".to_string(), 5), ("C".to_string(), 1), ("X".to_string(), 1)]
    );

    let repeat = qs.repeat_visitors(&d, 20).unwrap();
    assert_eq!(repeat.len(), 2);
    assert_eq!(repeat[0].tag_id, "T1");
    assert_eq!(repeat[0].visits, 3);
}

#[test]
fn test_slot_aggregates() {
    let qs = query_set();
    let d = day(1);

    let slots: Vec<(String, i64)> = qs
        .slot_visits(&d)
        .unwrap()
        .into_iter()
        .map(|s| (s.slot, s.visits))
        .collect();
    assert_eq!(
        slots,
        vec![
            ("10-13".to_string(), 4),
            ("13-16".to_string(), 2),
            ("other".to_string(), 1),
        ]
    );

    let flow: Vec<(String, i64, i64)> = qs
        .slot_flow(&d)
        .unwrap()
        .into_iter()
        .map(|s| (s.slot, s.entries, s.exits))
        .collect();
    assert_eq!(
        flow,
        vec![
            ("10-13".to_string(), 4, 3),
            ("13-16".to_string(), 2, 2),
            ("other".to_string(), 1, 1),
        ]
    );
}

#[test]
fn test_movement_aggregates() {
    let qs = query_set();
    let d = day(1);

    let transitions: Vec<(String, String, i64)> = qs
        .transitions(&d, 50)
        .unwrap()
        .into_iter()
        .map(|t| (t.from_building, t.to_building, t.transitions))
        .collect();
    assert_eq!(
        transitions,
        vec![
            ("B1".to_string(), "B2".to_string(), 2),
            ("B2".to_string(), "B1".to_string(), 1),
        ]
    );
    assert_eq!(qs.transitions(&d, 1).unwrap().len(), 1);

    let busiest = qs.busiest_buildings(&d, 2).unwrap();
    assert_eq!(busiest.len(), 2);
    assert_eq!(busiest[0].dept_name, "Engineering");

    let avg = qs.avg_buildings_per_visitor(&d).unwrap().unwrap();
    assert!(close(avg, 1.5));
}

#[test]
fn test_security_aggregates() {
    let qs = query_set();
    let d = day(1);

    let orphans = qs.orphan_entries(&d).unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].building_id, "X9");

    let overstays = qs.overstays(&d, 120).unwrap();
    assert_eq!(overstays.len(), 1);
    assert_eq!(overstays[0].tag_id, "T2");
    assert!(close(overstays[0].minutes, 310.0));
    assert!(qs.overstays(&d, 400).unwrap().is_empty());
    // 阈值以下的停留（40 分钟）不计入
    assert_eq!(qs.overstays(&d, 35).unwrap().len(), 3);

    let open = qs.open_sessions(&d).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].building_id, "C1");

    let after = qs.after_hours(&d).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].building_name, BuildingName::Found("Science".to_string()));
    assert_eq!(after[0].entries, 1);

    let bursts = qs.congestion_bursts(&d, 1).unwrap();
    assert_eq!(bursts.len(), 1);
    assert_eq!((bursts[0].building_id.as_str(), bursts[0].slot.as_str(), bursts[0].entries), ("B1", "10-13", 2));
    // 严格大于: 阈值等于计数时不算拥堵
    assert!(qs.congestion_bursts(&d, 2).unwrap().is_empty());

    let lookup = qs
        .lookup_buildings(&["B2".to_string(), "X9".to_string(), "B2".to_string()])
        .unwrap();
    assert_eq!(lookup.get("B2").display(), "Science");
    assert_eq!(lookup.get("X9").display(), UNKNOWN_BUILDING);
}

#[test]
fn test_event_aggregates() {
    let qs = query_set();
    let d1 = day(1);
    let d2 = day(2);

    let today = qs.event_overview(d1.date, d1.date).unwrap().unwrap();
    assert_eq!(today.total_events, 3);
    assert!(close(today.avg_duration_minutes.unwrap(), 90.0));

    let to_date = qs.event_overview(d1.date, d2.date).unwrap().unwrap();
    assert_eq!(to_date.total_events, 4);
    assert!(qs.event_overview(day(4).date, day(4).date).unwrap().is_none());

    let hourly: Vec<(u32, i64)> = qs
        .hourly_events(&d1)
        .unwrap()
        .iter()
        .map(|h| (h.hour, h.events))
        .collect();
    assert_eq!(hourly, vec![(9, 1), (13, 2)]);

    let categories = qs.event_categories(&d1).unwrap();
    assert_eq!(categories[0].category_name, "Talk");
    assert_eq!(categories[0].event_count, 2);

    let locations = qs.event_locations(&d1).unwrap();
    assert_eq!(locations.len(), 3);
    assert!(locations.iter().any(|l| l.location.is_none()));

    let speakers = qs.event_speakers(&d1).unwrap();
    let alice = speakers.iter().find(|s| s.speaker_name == "Alice").unwrap();
    assert_eq!(alice.event_count, 2);

    let pairs = qs.event_location_speakers(&d1).unwrap();
    assert_eq!(pairs.len(), 4);
}

#[test]
fn test_queries_空结果() {
    let qs = query_set();
    let d = day(5);
    assert_eq!(d.date_str(), "2025-11-01");
    assert!(qs.building_visits(&d).unwrap().is_empty());
    assert!(qs.slot_flow(&d).unwrap().is_empty());
    assert!(qs.avg_buildings_per_visitor(&d).unwrap().is_none());
    assert!(qs.congestion_bursts(&d, 0).unwrap().is_empty());
    assert!(qs.event_categories(&d).unwrap().is_empty());
}

#[test]
fn test_avg_dwell_skips_unparsable_exit_time() {
    let qs = query_set_with(
        "INSERT INTO entry_exit_log (tag_id, building_id, entry_time, exit_time)
         VALUES ('T6', 'B1', '2025-10-28 10:00:00', ''),
                ('T7', 'B2', '2025-10-28 11:00:00', 'later');",
    );
    let d = day(1);

    let dwell = qs.avg_dwell(&d).unwrap();
    assert_eq!(dwell.len(), 2);
    assert!(close(dwell[0].avg_minutes, 130.0));
    assert!(close(dwell[1].avg_minutes, 30.0));

    // 访问次数仍然计入
    let visits = qs.building_visits(&d).unwrap();
    assert_eq!(visits.iter().find(|v| v.building_id == "B1").unwrap().visits, 4);
}

#[test]
fn test_blank_locations_grouped_with_missing() {
    let qs = query_set_with(
        "INSERT INTO events (event_id, event_name, location, start_time, end_time)
         VALUES (5, 'Meetup', '', '2025-10-28 16:00:00', '2025-10-28 17:00:00'),
                (6, 'Demo', '   ', '2025-10-28 17:00:00', '2025-10-28 17:30:00');
         INSERT INTO event_speaker (event_id, speaker_name) VALUES (5, 'Bob'), (6, 'Bob');",
    );
    let d = day(1);

    let locations = qs.event_locations(&d).unwrap();
    assert_eq!(locations.len(), 3);
    let unspecified = locations.iter().find(|l| l.location.is_none()).unwrap();
    assert_eq!(unspecified.event_count, 3);

    let pairs = qs.event_location_speakers(&d).unwrap();
    let bob_unspecified: Vec<_> = pairs
        .iter()
        .filter(|p| p.location.is_none() && p.speaker_name == "Bob")
        .collect();
    assert_eq!(bob_unspecified.len(), 1);
    assert_eq!(bob_unspecified[0].event_count, 3);
}
