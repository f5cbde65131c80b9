// ==========================================
// 展会访客分析导出 - 活动汇总报表（仅 PDF）
// ==========================================
// 分节: Event Overview / Events by Hour / Events by Category /
//       Events by Location / Events by Speaker / Speakers by Location
// 约束: 概览按 "当日" 与 "开展至今" 两个窗口统计，窗口无活动时省略该行
// ==========================================

use chrono::NaiveDate;

use crate::domain::document::{
    CellValue, ChartKind, ChartSpec, Column, PdfDocument, PdfPage, ReportSection, TitlePage,
    NOT_AVAILABLE,
};
use crate::domain::rows::{
    location_display, CategoryCount, EventOverview, HourlyEvents, LocationCount, LocationSpeakerCount,
    SpeakerCount,
};
use crate::domain::types::{ReportKind, ResolvedDay};
use crate::repository::query_set::AggregateQuerySet;
use crate::repository::RepositoryResult;

/// 概览统计窗口
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewWindow {
    pub label: String,
    pub overview: EventOverview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSummaryData {
    pub day: ResolvedDay,
    pub overview: Vec<OverviewWindow>,
    pub hourly: Vec<HourlyEvents>,
    pub categories: Vec<CategoryCount>,
    pub locations: Vec<LocationCount>,
    pub speakers: Vec<SpeakerCount>,
    pub location_speakers: Vec<LocationSpeakerCount>,
}

impl EventSummaryData {
    pub fn empty(day: ResolvedDay) -> Self {
        Self {
            day,
            overview: Vec::new(),
            hourly: Vec::new(),
            categories: Vec::new(),
            locations: Vec::new(),
            speakers: Vec::new(),
            location_speakers: Vec::new(),
        }
    }

    /// 当日活动总数（无概览时为 0）
    pub fn events_today(&self) -> i64 {
        self.overview
            .first()
            .filter(|w| w.label.starts_with("Day "))
            .map(|w| w.overview.total_events)
            .unwrap_or(0)
    }
}

pub fn collect(
    queries: &AggregateQuerySet,
    day: &ResolvedDay,
    start_date: NaiveDate,
) -> RepositoryResult<EventSummaryData> {
    let windows = [
        (format!("Day {}", day.day), day.date, day.date),
        ("Exhibition to date".to_string(), start_date, day.date),
    ];

    let mut overview = Vec::new();
    for (label, from, to) in windows {
        if let Some(o) = queries.event_overview(from, to)? {
            if o.total_events > 0 {
                overview.push(OverviewWindow { label, overview: o });
            }
        }
    }

    Ok(EventSummaryData {
        day: *day,
        overview,
        hourly: queries.hourly_events(day)?,
        categories: queries.event_categories(day)?,
        locations: queries.event_locations(day)?,
        speakers: queries.event_speakers(day)?,
        location_speakers: queries.event_location_speakers(day)?,
    })
}

fn overview_section(data: &EventSummaryData) -> ReportSection {
    ReportSection::new(
        "Event Overview",
        vec![
            Column::text("Window"),
            Column::count("Total Events"),
            Column::decimal("Avg Duration (min)"),
            Column::text("First Event"),
            Column::text("Last Event"),
        ],
    )
    .with_rows(data.overview.iter().map(|w| {
        vec![
            CellValue::text(w.label.clone()),
            CellValue::Int(w.overview.total_events),
            CellValue::opt_float(w.overview.avg_duration_minutes),
            CellValue::opt_text(w.overview.first_event.clone()),
            CellValue::opt_text(w.overview.last_event.clone()),
        ]
    }))
}

pub fn build_pdf(data: &EventSummaryData) -> PdfDocument {
    let hourly = ReportSection::new("Events by Hour", vec![Column::hour("Hour"), Column::count("Events")])
        .with_rows(
            data.hourly
                .iter()
                .map(|h| vec![CellValue::Int(i64::from(h.hour)), CellValue::Int(h.events)]),
        );
    let hourly_chart = ChartSpec::new("Events per Hour", ChartKind::Line).with_points(
        data.hourly
            .iter()
            .map(|h| (format!("{:02}:00", h.hour), h.events as f64)),
    );

    let categories = ReportSection::new(
        "Events by Category",
        vec![Column::text("Category"), Column::count("Events")],
    )
    .with_rows(
        data.categories
            .iter()
            .map(|c| vec![CellValue::text(c.category_name.clone()), CellValue::Int(c.event_count)]),
    );
    let category_chart = ChartSpec::new("Events by Category", ChartKind::Bar).with_points(
        data.categories
            .iter()
            .map(|c| (c.category_name.clone(), c.event_count as f64)),
    );

    let locations = ReportSection::new(
        "Events by Location",
        vec![Column::text("Location"), Column::count("Events")],
    )
    .with_rows(data.locations.iter().map(|l| {
        vec![
            CellValue::text(location_display(&l.location)),
            CellValue::Int(l.event_count),
        ]
    }));
    let location_chart = ChartSpec::new("Events by Location", ChartKind::Bar).with_points(
        data.locations
            .iter()
            .map(|l| (location_display(&l.location).to_string(), l.event_count as f64)),
    );

    let speakers = ReportSection::new(
        "Events by Speaker",
        vec![Column::text("Speaker"), Column::count("Events")],
    )
    .with_rows(
        data.speakers
            .iter()
            .map(|s| vec![CellValue::text(s.speaker_name.clone()), CellValue::Int(s.event_count)]),
    );

    let location_speakers = ReportSection::new(
        "Speakers by Location",
        vec![
            Column::text("Location"),
            Column::text("Speaker"),
            Column::count("Events"),
        ],
    )
    .with_rows(data.location_speakers.iter().map(|ls| {
        vec![
            CellValue::text(location_display(&ls.location)),
            CellValue::text(ls.speaker_name.clone()),
            CellValue::Int(ls.event_count),
        ]
    }));

    let top_category = data
        .categories
        .first()
        .map(|c| c.category_name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    PdfDocument {
        title_page: TitlePage {
            title: ReportKind::EventSummary.title().to_string(),
            subtitle: data.day.to_string(),
            facts: vec![
                ("Report Date".to_string(), data.day.date_str()),
                ("Exhibition Day".to_string(), data.day.day.to_string()),
                ("Events Today".to_string(), data.events_today().to_string()),
                ("Categories".to_string(), data.categories.len().to_string()),
                ("Top Category".to_string(), top_category),
                ("Speakers".to_string(), data.speakers.len().to_string()),
            ],
        },
        pages: vec![
            PdfPage::table(overview_section(data)),
            PdfPage::charted(hourly, hourly_chart),
            PdfPage::charted(categories, category_chart),
            PdfPage::charted(locations, location_chart),
            PdfPage::table(speakers),
            PdfPage::table(location_speakers),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::NO_DATA;
    use crate::domain::rows::UNSPECIFIED_LOCATION;

    fn day3() -> ResolvedDay {
        ResolvedDay {
            day: 3,
            date: NaiveDate::from_ymd_opt(2025, 10, 30).unwrap(),
        }
    }

    fn overview(total: i64, avg: f64) -> EventOverview {
        EventOverview {
            total_events: total,
            avg_duration_minutes: Some(avg),
            first_event: Some("2025-10-30 09:00:00".into()),
            last_event: Some("2025-10-30 17:00:00".into()),
        }
    }

    #[test]
    fn test_overview_rows() {
        let data = EventSummaryData {
            overview: vec![
                OverviewWindow { label: "Day 3".into(), overview: overview(5, 90.5) },
                OverviewWindow { label: "Exhibition to date".into(), overview: overview(12, 75.0) },
            ],
            ..EventSummaryData::empty(day3())
        };
        assert_eq!(data.events_today(), 5);

        let rows = overview_section(&data).formatted_rows();
        assert_eq!(rows[0][0], "Day 3");
        assert_eq!(rows[0][2], "90.5");
        assert_eq!(rows[1][1], "12");
    }

    #[test]
    fn test_location_fallback() {
        let data = EventSummaryData {
            locations: vec![
                LocationCount { location: Some("Hall A".into()), event_count: 3 },
                LocationCount { location: None, event_count: 1 },
            ],
            ..EventSummaryData::empty(day3())
        };
        let pdf = build_pdf(&data);
        let rows = pdf.pages[3].sections[0].formatted_rows();
        assert_eq!(rows[1][0], UNSPECIFIED_LOCATION);
        let chart = pdf.pages[3].chart.as_ref().unwrap();
        assert_eq!(chart.points[1].bucket, UNSPECIFIED_LOCATION);
    }

    #[test]
    fn test_empty_report_has_every_page() {
        let pdf = build_pdf(&EventSummaryData::empty(day3()));
        assert_eq!(
            pdf.page_headings(),
            vec![
                "Event Overview",
                "Events by Hour",
                "Events by Category",
                "Events by Location",
                "Events by Speaker",
                "Speakers by Location",
            ]
        );
        assert_eq!(pdf.pages[0].sections[0].formatted_rows()[0][0], NO_DATA);
    }
}
