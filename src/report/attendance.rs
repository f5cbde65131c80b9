// ==========================================
// 展会访客分析导出 - 出勤与使用报表
// ==========================================
// CSV 分节: Attendance Summary / Visits by Time Slot / Visits by Zone / SUMMARY
// PDF 分页: Building Attendance / Visits by Time Slot / Hourly Entries /
//           Visits by Zone / Exits by Building / Top Repeat Visitors
// ==========================================

use std::collections::HashMap;

use crate::domain::document::{
    format_decimal, CellValue, ChartKind, ChartSpec, Column, CsvDocument, PdfDocument, PdfPage,
    ReportSection, TitlePage, NOT_AVAILABLE,
};
use crate::domain::rows::{
    AvgDwell, BuildingExits, BuildingPeakHour, BuildingVisits, HourlyEntries, RepeatVisitor,
    SlotVisits, UniqueVisitors, ZoneVisits,
};
use crate::domain::types::{ReportKind, ResolvedDay, SlotPlan};
use crate::repository::query_set::AggregateQuerySet;
use crate::repository::RepositoryResult;

/// 出勤报表所需的全部查询结果
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceData {
    pub day: ResolvedDay,
    pub building_visits: Vec<BuildingVisits>,
    pub unique_visitors: Vec<UniqueVisitors>,
    pub avg_dwell: Vec<AvgDwell>,
    pub hourly_entries: Vec<HourlyEntries>,
    pub peak_hours: Vec<BuildingPeakHour>,
    pub slot_visits: Vec<SlotVisits>,
    pub building_exits: Vec<BuildingExits>,
    pub zone_visits: Vec<ZoneVisits>,
    pub repeat_visitors: Vec<RepeatVisitor>,
}

impl AttendanceData {
    pub fn empty(day: ResolvedDay) -> Self {
        Self {
            day,
            building_visits: Vec::new(),
            unique_visitors: Vec::new(),
            avg_dwell: Vec::new(),
            hourly_entries: Vec::new(),
            peak_hours: Vec::new(),
            slot_visits: Vec::new(),
            building_exits: Vec::new(),
            zone_visits: Vec::new(),
            repeat_visitors: Vec::new(),
        }
    }
}

pub fn collect(
    queries: &AggregateQuerySet,
    day: &ResolvedDay,
    repeat_limit: usize,
) -> RepositoryResult<AttendanceData> {
    Ok(AttendanceData {
        day: *day,
        building_visits: queries.building_visits(day)?,
        unique_visitors: queries.unique_visitors(day)?,
        avg_dwell: queries.avg_dwell(day)?,
        hourly_entries: queries.hourly_entries(day)?,
        peak_hours: queries.building_peak_hours(day)?,
        slot_visits: queries.slot_visits(day)?,
        building_exits: queries.building_exits(day)?,
        zone_visits: queries.zone_visits(day)?,
        repeat_visitors: queries.repeat_visitors(day, repeat_limit)?,
    })
}

/// 单个楼栋的合并行
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingAttendance {
    pub dept_name: String,
    pub building_id: String,
    pub visits: i64,
    pub unique_visitors: i64,
    pub repeat_visits: i64,
    pub avg_minutes: Option<f64>,
    pub peak_hour: Option<u32>,
}

/// 以入场次数为主表，按 building_id 合并独立访客、平均停留与高峰小时
pub fn merge_buildings(data: &AttendanceData) -> Vec<BuildingAttendance> {
    let unique: HashMap<&str, i64> = data
        .unique_visitors
        .iter()
        .map(|r| (r.building_id.as_str(), r.unique_visitors))
        .collect();
    let dwell: HashMap<&str, f64> = data
        .avg_dwell
        .iter()
        .map(|r| (r.building_id.as_str(), r.avg_minutes))
        .collect();
    let peaks: HashMap<&str, u32> = data
        .peak_hours
        .iter()
        .map(|r| (r.building_id.as_str(), r.hour))
        .collect();

    data.building_visits
        .iter()
        .map(|b| {
            let unique_visitors = unique.get(b.building_id.as_str()).copied().unwrap_or(0);
            BuildingAttendance {
                dept_name: b.dept_name.clone(),
                building_id: b.building_id.clone(),
                visits: b.visits,
                unique_visitors,
                repeat_visits: (b.visits - unique_visitors).max(0),
                avg_minutes: dwell.get(b.building_id.as_str()).copied(),
                peak_hour: peaks.get(b.building_id.as_str()).copied(),
            }
        })
        .collect()
}

/// 全天汇总
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSummary {
    pub total_visits: i64,
    pub unique_visitors: i64,
    pub repeat_visits: i64,
    /// 按入场次数加权的平均停留
    pub avg_minutes: Option<f64>,
    pub busiest_building: Option<String>,
    pub peak_slot: Option<String>,
}

pub fn summarize(data: &AttendanceData) -> AttendanceSummary {
    let buildings = merge_buildings(data);
    let total_visits: i64 = buildings.iter().map(|b| b.visits).sum();
    let unique_visitors: i64 = buildings.iter().map(|b| b.unique_visitors).sum();

    let (weighted, weight) = buildings
        .iter()
        .filter_map(|b| b.avg_minutes.map(|m| (m * b.visits as f64, b.visits as f64)))
        .fold((0.0, 0.0), |(sum, w), (x, v)| (sum + x, w + v));
    let avg_minutes = (weight > 0.0).then(|| weighted / weight);

    // 同票时取时段顺序靠前者
    let peak_slot = data
        .slot_visits
        .iter()
        .fold(None::<&SlotVisits>, |best, s| match best {
            Some(b) if b.visits >= s.visits => Some(b),
            _ => Some(s),
        })
        .map(|s| s.slot.clone());

    AttendanceSummary {
        total_visits,
        unique_visitors,
        repeat_visits: (total_visits - unique_visitors).max(0),
        avg_minutes,
        busiest_building: buildings
            .iter()
            .fold(None::<&BuildingAttendance>, |best, b| match best {
                Some(top) if top.visits >= b.visits => Some(top),
                _ => Some(b),
            })
            .map(|b| b.dept_name.clone()),
        peak_slot,
    }
}

fn building_section(title: &str, data: &AttendanceData) -> ReportSection {
    ReportSection::new(
        title,
        vec![
            Column::text("Building"),
            Column::text("Building ID"),
            Column::count("Total Visits"),
            Column::count("Unique Visitors"),
            Column::count("Repeat Visits"),
            Column::decimal("Avg Duration"),
            Column::hour("Peak Entry Hour"),
        ],
    )
    .with_rows(merge_buildings(data).into_iter().map(|b| {
        vec![
            CellValue::Text(b.dept_name),
            CellValue::Text(b.building_id),
            CellValue::Int(b.visits),
            CellValue::Int(b.unique_visitors),
            CellValue::Int(b.repeat_visits),
            CellValue::opt_float(b.avg_minutes),
            CellValue::opt_int(b.peak_hour.map(i64::from)),
        ]
    }))
}

fn zone_section(data: &AttendanceData) -> ReportSection {
    ReportSection::new("Visits by Zone", vec![Column::text("Zone"), Column::count("Visits")]).with_rows(
        data.zone_visits
            .iter()
            .map(|z| vec![CellValue::text(z.zone.clone()), CellValue::Int(z.visits)]),
    )
}

fn summary_section(data: &AttendanceData) -> ReportSection {
    let summary = summarize(data);
    let mut section = ReportSection::new(
        "SUMMARY",
        vec![
            Column::text("Report Date"),
            Column::count("Day"),
            Column::count("Total Visits"),
            Column::count("Unique Visitors"),
            Column::count("Repeat Visits"),
            Column::decimal("Avg Duration"),
            Column::text("Busiest Building"),
            Column::text("Peak Time Slot"),
        ],
    );
    section.push_row(vec![
        CellValue::text(data.day.date_str()),
        CellValue::Int(i64::from(data.day.day)),
        CellValue::Int(summary.total_visits),
        CellValue::Int(summary.unique_visitors),
        CellValue::Int(summary.repeat_visits),
        CellValue::opt_float(summary.avg_minutes),
        CellValue::opt_text(summary.busiest_building),
        CellValue::opt_text(summary.peak_slot),
    ]);
    section
}

pub fn build_csv(data: &AttendanceData) -> CsvDocument {
    let slots = ReportSection::new("Visits by Time Slot", vec![Column::text("Time Slot"), Column::count("Visits")])
        .with_rows(data.slot_visits.iter().map(|s| {
            vec![
                CellValue::text(format!("Time Slot: {}", s.slot)),
                CellValue::Int(s.visits),
            ]
        }));

    CsvDocument {
        sections: vec![
            building_section("Attendance Summary", data),
            slots,
            zone_section(data),
            summary_section(data),
        ],
    }
}

pub fn build_pdf(data: &AttendanceData, slot_plan: &SlotPlan) -> PdfDocument {
    let summary = summarize(data);

    let slot_section = ReportSection::new("Visits by Time Slot", vec![Column::text("Time Slot"), Column::count("Visits")])
        .with_rows(data.slot_visits.iter().map(|s| {
            vec![
                CellValue::text(slot_plan.label_for_key(&s.slot)),
                CellValue::Int(s.visits),
            ]
        }));
    let slot_chart = ChartSpec::new("Visits by Time Slot", ChartKind::Bar).with_points(
        data.slot_visits
            .iter()
            .map(|s| (slot_plan.label_for_key(&s.slot), s.visits as f64)),
    );

    let hourly_section = ReportSection::new("Hourly Entries", vec![Column::hour("Hour"), Column::count("Entries")])
        .with_rows(
            data.hourly_entries
                .iter()
                .map(|h| vec![CellValue::Int(i64::from(h.hour)), CellValue::Int(h.entries)]),
        );
    let hourly_chart = ChartSpec::new("Entries per Hour", ChartKind::Line).with_points(
        data.hourly_entries
            .iter()
            .map(|h| (format!("{:02}:00", h.hour), h.entries as f64)),
    );

    let zone_chart = ChartSpec::new("Visits by Zone", ChartKind::Bar)
        .with_points(data.zone_visits.iter().map(|z| (z.zone.clone(), z.visits as f64)));

    let exits = ReportSection::new("Exits by Building", vec![Column::text("Building ID"), Column::count("Exits")])
        .with_rows(
            data.building_exits
                .iter()
                .map(|e| vec![CellValue::text(e.building_id.clone()), CellValue::Int(e.exits)]),
        );

    let repeat = ReportSection::new("Top Repeat Visitors", vec![Column::text("Tag ID"), Column::count("Visits")])
        .with_rows(
            data.repeat_visitors
                .iter()
                .map(|r| vec![CellValue::text(r.tag_id.clone()), CellValue::Int(r.visits)]),
        );

    let avg = summary
        .avg_minutes
        .map(|m| format!("{} min", format_decimal(m)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    PdfDocument {
        title_page: TitlePage {
            title: ReportKind::Attendance.title().to_string(),
            subtitle: data.day.to_string(),
            facts: vec![
                ("Report Date".to_string(), data.day.date_str()),
                ("Exhibition Day".to_string(), data.day.day.to_string()),
                ("Total Visits".to_string(), summary.total_visits.to_string()),
                ("Unique Visitors".to_string(), summary.unique_visitors.to_string()),
                ("Repeat Visits".to_string(), summary.repeat_visits.to_string()),
                ("Average Duration".to_string(), avg),
                (
                    "Busiest Building".to_string(),
                    summary.busiest_building.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                ),
                (
                    "Peak Time Slot".to_string(),
                    summary
                        .peak_slot
                        .map(|s| slot_plan.label_for_key(&s))
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                ),
            ],
        },
        pages: vec![
            PdfPage::table(building_section("Building Attendance", data)),
            PdfPage::charted(slot_section, slot_chart),
            PdfPage::charted(hourly_section, hourly_chart),
            PdfPage::charted(zone_section(data), zone_chart),
            PdfPage::table(exits),
            PdfPage::table(repeat),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day1() -> ResolvedDay {
        ResolvedDay {
            day: 1,
            date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
        }
    }

    fn sample() -> AttendanceData {
        AttendanceData {
            building_visits: vec![
                BuildingVisits { dept_name: "Engineering".into(), building_id: "B1".into(), visits: 12 },
                BuildingVisits { dept_name: "Science".into(), building_id: "B2".into(), visits: 8 },
            ],
            unique_visitors: vec![
                UniqueVisitors { dept_name: "Engineering".into(), building_id: "B1".into(), unique_visitors: 10 },
                UniqueVisitors { dept_name: "Science".into(), building_id: "B2".into(), unique_visitors: 7 },
            ],
            avg_dwell: vec![
                AvgDwell { dept_name: "Engineering".into(), building_id: "B1".into(), avg_minutes: 42.5 },
                AvgDwell { dept_name: "Science".into(), building_id: "B2".into(), avg_minutes: 30.0 },
            ],
            peak_hours: vec![BuildingPeakHour { building_id: "B1".into(), hour: 14, entries: 7 }],
            slot_visits: vec![
                SlotVisits { slot: "10-13".into(), visits: 8 },
                SlotVisits { slot: "13-16".into(), visits: 8 },
                SlotVisits { slot: "16-19".into(), visits: 4 },
            ],
            ..AttendanceData::empty(day1())
        }
    }

    #[test]
    fn test_merge_buildings() {
        let merged = merge_buildings(&sample());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].repeat_visits, 2);
        assert_eq!(merged[0].peak_hour, Some(14));
        assert_eq!(merged[1].peak_hour, None);
        assert_eq!(merged[1].avg_minutes, Some(30.0));
    }

    #[test]
    fn test_summary_weighted_average_and_peak_tie() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_visits, 20);
        assert_eq!(summary.unique_visitors, 17);
        assert_eq!(summary.repeat_visits, 3);
        // (42.5*12 + 30*8) / 20 = 37.5
        assert_eq!(summary.avg_minutes, Some(37.5));
        assert_eq!(summary.busiest_building.as_deref(), Some("Engineering"));
        assert_eq!(summary.peak_slot.as_deref(), Some("10-13"));
    }

    #[test]
    fn test_csv_document_order() {
        let doc = build_csv(&sample());
        assert_eq!(
            doc.section_titles(),
            vec!["Attendance Summary", "Visits by Time Slot", "Visits by Zone", "SUMMARY"]
        );
        let rows = doc.sections[0].formatted_rows();
        assert_eq!(rows[0], vec!["Engineering", "B1", "12", "10", "2", "42.5", "14:00"]);
        assert_eq!(rows[1][6], NOT_AVAILABLE);
    }

    #[test]
    fn test_empty_data_keeps_every_section() {
        let data = AttendanceData::empty(day1());
        let doc = build_csv(&data);
        assert_eq!(doc.sections.len(), 4);
        assert_eq!(doc.sections[0].formatted_rows()[0][0], "No data");
        let summary = doc.sections[3].formatted_rows();
        assert_eq!(summary[0][2], "0");
        assert_eq!(summary[0][5], NOT_AVAILABLE);

        let pdf = build_pdf(&data, &SlotPlan::default());
        assert_eq!(pdf.pages.len(), 6);
    }
}
