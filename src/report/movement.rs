// ==========================================
// 展会访客分析导出 - 人流动线报表
// ==========================================
// 分节: Entry vs Exit by Time Slot / Zone Transitions (Top N) /
//       Busiest Buildings / Busiest Zones / Average Buildings Visited per Person
// CSV 末尾追加 SUMMARY，PDF 首页为封面
// ==========================================

use crate::domain::document::{
    format_decimal, CellValue, ChartKind, ChartSpec, Column, CsvDocument, PdfDocument, PdfPage,
    ReportSection, TitlePage, NOT_AVAILABLE,
};
use crate::domain::rows::{BusiestBuilding, SlotFlow, Transition, ZoneVisits};
use crate::domain::types::{ReportKind, ResolvedDay, SlotPlan};
use crate::repository::query_set::AggregateQuerySet;
use crate::repository::RepositoryResult;

#[derive(Debug, Clone, PartialEq)]
pub struct MovementData {
    pub day: ResolvedDay,
    pub transition_limit: usize,
    pub slot_flow: Vec<SlotFlow>,
    pub transitions: Vec<Transition>,
    pub busiest_buildings: Vec<BusiestBuilding>,
    pub busiest_zones: Vec<ZoneVisits>,
    pub avg_buildings_per_visitor: Option<f64>,
}

impl MovementData {
    pub fn empty(day: ResolvedDay, transition_limit: usize) -> Self {
        Self {
            day,
            transition_limit,
            slot_flow: Vec::new(),
            transitions: Vec::new(),
            busiest_buildings: Vec::new(),
            busiest_zones: Vec::new(),
            avg_buildings_per_visitor: None,
        }
    }

    pub fn total_entries(&self) -> i64 {
        self.slot_flow.iter().map(|s| s.entries).sum()
    }

    pub fn total_exits(&self) -> i64 {
        self.slot_flow.iter().map(|s| s.exits).sum()
    }

    pub fn total_transitions(&self) -> i64 {
        self.transitions.iter().map(|t| t.transitions).sum()
    }
}

pub fn collect(
    queries: &AggregateQuerySet,
    day: &ResolvedDay,
    transition_limit: usize,
    busiest_limit: usize,
) -> RepositoryResult<MovementData> {
    let mut busiest_zones = queries.zone_visits(day)?;
    busiest_zones.truncate(busiest_limit);

    Ok(MovementData {
        day: *day,
        transition_limit,
        slot_flow: queries.slot_flow(day)?,
        transitions: queries.transitions(day, transition_limit)?,
        busiest_buildings: queries.busiest_buildings(day, busiest_limit)?,
        busiest_zones,
        avg_buildings_per_visitor: queries.avg_buildings_per_visitor(day)?,
    })
}

fn flow_section<F>(data: &MovementData, slot_label: F) -> ReportSection
where
    F: Fn(&str) -> String,
{
    ReportSection::new(
        "Entry vs Exit by Time Slot",
        vec![
            Column::text("Time Slot"),
            Column::count("Entries"),
            Column::count("Exits"),
            Column::count("Net Flow"),
        ],
    )
    .with_rows(data.slot_flow.iter().map(|s| {
        vec![
            CellValue::text(slot_label(&s.slot)),
            CellValue::Int(s.entries),
            CellValue::Int(s.exits),
            CellValue::Int(s.entries - s.exits),
        ]
    }))
}

fn transitions_section(data: &MovementData) -> ReportSection {
    ReportSection::new(
        format!("Zone Transitions (Top {})", data.transition_limit),
        vec![
            Column::text("From Building"),
            Column::text("To Building"),
            Column::count("Transitions"),
        ],
    )
    .with_rows(data.transitions.iter().map(|t| {
        vec![
            CellValue::text(t.from_building.clone()),
            CellValue::text(t.to_building.clone()),
            CellValue::Int(t.transitions),
        ]
    }))
}

fn busiest_buildings_section(data: &MovementData) -> ReportSection {
    ReportSection::new(
        "Busiest Buildings",
        vec![
            Column::text("Building"),
            Column::text("Building ID"),
            Column::count("Entries"),
        ],
    )
    .with_rows(data.busiest_buildings.iter().map(|b| {
        vec![
            CellValue::text(b.dept_name.clone()),
            CellValue::text(b.building_id.clone()),
            CellValue::Int(b.entries),
        ]
    }))
}

fn busiest_zones_section(data: &MovementData) -> ReportSection {
    ReportSection::new("Busiest Zones", vec![Column::text("Zone"), Column::count("Entries")]).with_rows(
        data.busiest_zones
            .iter()
            .map(|z| vec![CellValue::text(z.zone.clone()), CellValue::Int(z.visits)]),
    )
}

fn avg_buildings_section(data: &MovementData) -> ReportSection {
    ReportSection::new(
        "Average Buildings Visited per Person",
        vec![Column::decimal("Average Buildings")],
    )
    .with_rows(
        data.avg_buildings_per_visitor
            .map(|avg| vec![CellValue::Float(avg)]),
    )
}

fn summary_section(data: &MovementData) -> ReportSection {
    let entries = data.total_entries();
    let exits = data.total_exits();
    let mut section = ReportSection::new(
        "SUMMARY",
        vec![
            Column::text("Report Date"),
            Column::count("Day"),
            Column::count("Total Entries"),
            Column::count("Total Exits"),
            Column::count("Net Flow"),
            Column::count("Total Transitions"),
        ],
    );
    section.push_row(vec![
        CellValue::text(data.day.date_str()),
        CellValue::Int(i64::from(data.day.day)),
        CellValue::Int(entries),
        CellValue::Int(exits),
        CellValue::Int(entries - exits),
        CellValue::Int(data.total_transitions()),
    ]);
    section
}

pub fn build_csv(data: &MovementData) -> CsvDocument {
    CsvDocument {
        sections: vec![
            flow_section(data, |key| format!("Time Slot: {}", key)),
            transitions_section(data),
            busiest_buildings_section(data),
            busiest_zones_section(data),
            avg_buildings_section(data),
            summary_section(data),
        ],
    }
}

pub fn build_pdf(data: &MovementData, slot_plan: &SlotPlan) -> PdfDocument {
    let flow_chart = ChartSpec::new("Entries by Time Slot", ChartKind::Bar).with_points(
        data.slot_flow
            .iter()
            .map(|s| (slot_plan.label_for_key(&s.slot), s.entries as f64)),
    );
    let building_chart = ChartSpec::new("Busiest Buildings", ChartKind::Bar).with_points(
        data.busiest_buildings
            .iter()
            .map(|b| (b.building_id.clone(), b.entries as f64)),
    );
    let zone_chart = ChartSpec::new("Busiest Zones", ChartKind::Bar).with_points(
        data.busiest_zones
            .iter()
            .map(|z| (z.zone.clone(), z.visits as f64)),
    );

    let entries = data.total_entries();
    let exits = data.total_exits();

    PdfDocument {
        title_page: TitlePage {
            title: ReportKind::Movement.title().to_string(),
            subtitle: data.day.to_string(),
            facts: vec![
                ("Report Date".to_string(), data.day.date_str()),
                ("Exhibition Day".to_string(), data.day.day.to_string()),
                ("Total Entries".to_string(), entries.to_string()),
                ("Total Exits".to_string(), exits.to_string()),
                ("Net Flow".to_string(), (entries - exits).to_string()),
                ("Total Transitions".to_string(), data.total_transitions().to_string()),
                (
                    "Avg Buildings per Visitor".to_string(),
                    data.avg_buildings_per_visitor
                        .map(format_decimal)
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                ),
            ],
        },
        pages: vec![
            PdfPage::charted(flow_section(data, |key| slot_plan.label_for_key(key)), flow_chart),
            PdfPage::table(transitions_section(data)),
            PdfPage::charted(busiest_buildings_section(data), building_chart),
            PdfPage::charted(busiest_zones_section(data), zone_chart),
            PdfPage::table(avg_buildings_section(data)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::NO_DATA;
    use chrono::NaiveDate;

    fn day1() -> ResolvedDay {
        ResolvedDay {
            day: 1,
            date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
        }
    }

    fn sample() -> MovementData {
        MovementData {
            slot_flow: vec![
                SlotFlow { slot: "10-13".into(), entries: 5, exits: 3 },
                SlotFlow { slot: "13-16".into(), entries: 4, exits: 5 },
            ],
            transitions: vec![Transition {
                from_building: "B1".into(),
                to_building: "B2".into(),
                transitions: 4,
            }],
            busiest_buildings: vec![BusiestBuilding {
                dept_name: "Engineering".into(),
                building_id: "B1".into(),
                entries: 12,
            }],
            avg_buildings_per_visitor: Some(2.5),
            ..MovementData::empty(day1(), 50)
        }
    }

    #[test]
    fn test_csv_section_order() {
        let doc = build_csv(&sample());
        assert_eq!(
            doc.section_titles(),
            vec![
                "Entry vs Exit by Time Slot",
                "Zone Transitions (Top 50)",
                "Busiest Buildings",
                "Busiest Zones",
                "Average Buildings Visited per Person",
                "SUMMARY",
            ]
        );
    }

    #[test]
    fn test_net_flow_can_be_negative() {
        let doc = build_csv(&sample());
        let rows = doc.sections[0].formatted_rows();
        assert_eq!(rows[0], vec!["Time Slot: 10-13", "5", "3", "2"]);
        assert_eq!(rows[1][3], "-1");

        let summary = doc.sections[5].formatted_rows();
        assert_eq!(summary[0], vec!["2025-10-28", "1", "9", "8", "1", "4"]);
    }

    #[test]
    fn test_avg_buildings_missing_is_no_data() {
        let mut data = sample();
        data.avg_buildings_per_visitor = None;
        let doc = build_csv(&data);
        assert_eq!(doc.sections[4].formatted_rows()[0][0], NO_DATA);
        assert_eq!(doc.sections[3].formatted_rows()[0][0], NO_DATA);
    }

    #[test]
    fn test_pdf_uses_slot_labels() {
        let pdf = build_pdf(&sample(), &SlotPlan::default());
        assert_eq!(pdf.pages.len(), 5);
        let first = &pdf.pages[0];
        assert_eq!(first.sections[0].formatted_rows()[0][0], "10am-1pm");
        assert_eq!(first.chart.as_ref().map(|c| c.points.len()), Some(2));
    }
}
