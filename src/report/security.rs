// ==========================================
// 展会访客分析导出 - 安全与异常报表（仅 PDF）
// ==========================================
// 分节: Unmatched Building Entries / Overstays / Open Sessions /
//       After-hours Entries by Building / Congestion Bursts
// 约束: 阈值均为严格大于；楼栋名称查不到时显示 "Unknown Building"
// ==========================================

use crate::domain::document::{
    format_decimal, CellValue, ChartKind, ChartSpec, Column, PdfDocument, PdfPage, ReportSection,
    TitlePage,
};
use crate::domain::rows::{AfterHours, BuildingLookup, CongestionBurst, OpenSession, OrphanEntry, Overstay};
use crate::domain::types::{ReportKind, ResolvedDay, SlotPlan};
use crate::repository::query_set::AggregateQuerySet;
use crate::repository::RepositoryResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityData {
    pub day: ResolvedDay,
    pub overstay_minutes: u32,
    pub congestion_threshold: u32,
    pub orphan_entries: Vec<OrphanEntry>,
    pub overstays: Vec<Overstay>,
    pub open_sessions: Vec<OpenSession>,
    pub after_hours: Vec<AfterHours>,
    pub congestion_bursts: Vec<CongestionBurst>,
    /// 超时停留与未离场记录涉及的楼栋名称
    pub buildings: BuildingLookup,
}

impl SecurityData {
    pub fn empty(day: ResolvedDay, overstay_minutes: u32, congestion_threshold: u32) -> Self {
        Self {
            day,
            overstay_minutes,
            congestion_threshold,
            orphan_entries: Vec::new(),
            overstays: Vec::new(),
            open_sessions: Vec::new(),
            after_hours: Vec::new(),
            congestion_bursts: Vec::new(),
            buildings: BuildingLookup::default(),
        }
    }
}

pub fn collect(
    queries: &AggregateQuerySet,
    day: &ResolvedDay,
    overstay_minutes: u32,
    congestion_threshold: u32,
) -> RepositoryResult<SecurityData> {
    let overstays = queries.overstays(day, overstay_minutes)?;
    let open_sessions = queries.open_sessions(day)?;

    let ids: Vec<String> = overstays
        .iter()
        .map(|o| o.building_id.clone())
        .chain(open_sessions.iter().map(|s| s.building_id.clone()))
        .collect();
    let buildings = queries.lookup_buildings(&ids)?;

    Ok(SecurityData {
        day: *day,
        overstay_minutes,
        congestion_threshold,
        orphan_entries: queries.orphan_entries(day)?,
        overstays,
        open_sessions,
        after_hours: queries.after_hours(day)?,
        congestion_bursts: queries.congestion_bursts(day, congestion_threshold)?,
        buildings,
    })
}

fn orphan_section(data: &SecurityData) -> ReportSection {
    ReportSection::new(
        "Unmatched Building Entries",
        vec![
            Column::text("Tag ID"),
            Column::text("Building ID"),
            Column::text("Entry Time"),
        ],
    )
    .with_rows(data.orphan_entries.iter().map(|o| {
        vec![
            CellValue::text(o.tag_id.clone()),
            CellValue::text(o.building_id.clone()),
            CellValue::text(o.entry_time.clone()),
        ]
    }))
}

fn overstay_section(data: &SecurityData) -> ReportSection {
    ReportSection::new(
        format!("Overstays (> {} min)", data.overstay_minutes),
        vec![
            Column::text("Tag ID"),
            Column::text("Building"),
            Column::text("Entry Time"),
            Column::text("Exit Time"),
            Column::decimal("Minutes"),
        ],
    )
    .with_rows(data.overstays.iter().map(|o| {
        vec![
            CellValue::text(o.tag_id.clone()),
            CellValue::text(data.buildings.get(&o.building_id).display()),
            CellValue::text(o.entry_time.clone()),
            CellValue::text(o.exit_time.clone()),
            CellValue::Float(o.minutes),
        ]
    }))
}

fn open_session_section(data: &SecurityData) -> ReportSection {
    ReportSection::new(
        "Open Sessions",
        vec![
            Column::text("Tag ID"),
            Column::text("Building"),
            Column::text("Entry Time"),
        ],
    )
    .with_rows(data.open_sessions.iter().map(|s| {
        vec![
            CellValue::text(s.tag_id.clone()),
            CellValue::text(data.buildings.get(&s.building_id).display()),
            CellValue::text(s.entry_time.clone()),
        ]
    }))
}

fn after_hours_section(data: &SecurityData, slot_plan: &SlotPlan) -> ReportSection {
    ReportSection::new(
        "After-hours Entries by Building",
        vec![
            Column::text("Building"),
            Column::text("Building ID"),
            Column::count("Entries"),
        ],
    )
    .with_rows(data.after_hours.iter().map(|a| {
        vec![
            CellValue::text(a.building_name.display()),
            CellValue::text(a.building_id.clone()),
            CellValue::Int(a.entries),
        ]
    }))
    .with_note(format!(
        "Open hours: {:02}:00-{:02}:00",
        slot_plan.open_hour, slot_plan.close_hour
    ))
}

fn congestion_section(data: &SecurityData, slot_plan: &SlotPlan) -> ReportSection {
    ReportSection::new(
        format!("Congestion Bursts (> {} entries)", data.congestion_threshold),
        vec![
            Column::text("Building ID"),
            Column::text("Time Slot"),
            Column::count("Entries"),
        ],
    )
    .with_rows(data.congestion_bursts.iter().map(|c| {
        vec![
            CellValue::text(c.building_id.clone()),
            CellValue::text(slot_plan.label_for_key(&c.slot)),
            CellValue::Int(c.entries),
        ]
    }))
}

pub fn build_pdf(data: &SecurityData, slot_plan: &SlotPlan) -> PdfDocument {
    let after_hours_chart = ChartSpec::new("After-hours Entries", ChartKind::Bar).with_points(
        data.after_hours
            .iter()
            .map(|a| (a.building_id.clone(), a.entries as f64)),
    );
    let longest = data
        .overstays
        .iter()
        .map(|o| o.minutes)
        .fold(None::<f64>, |acc, m| Some(acc.map_or(m, |a| a.max(m))));

    let mut facts = vec![
        ("Report Date".to_string(), data.day.date_str()),
        ("Exhibition Day".to_string(), data.day.day.to_string()),
        ("Overstay Threshold".to_string(), format!("{} min", data.overstay_minutes)),
        (
            "Congestion Threshold".to_string(),
            format!("{} entries per slot", data.congestion_threshold),
        ),
        ("Unmatched Entries".to_string(), data.orphan_entries.len().to_string()),
        ("Overstays".to_string(), data.overstays.len().to_string()),
        ("Open Sessions".to_string(), data.open_sessions.len().to_string()),
        (
            "After-hours Entries".to_string(),
            data.after_hours.iter().map(|a| a.entries).sum::<i64>().to_string(),
        ),
        ("Congestion Bursts".to_string(), data.congestion_bursts.len().to_string()),
    ];
    if let Some(minutes) = longest {
        facts.push(("Longest Overstay".to_string(), format!("{} min", format_decimal(minutes))));
    }

    PdfDocument {
        title_page: TitlePage {
            title: ReportKind::Security.title().to_string(),
            subtitle: data.day.to_string(),
            facts,
        },
        pages: vec![
            PdfPage::table(orphan_section(data)),
            PdfPage::table(overstay_section(data)),
            PdfPage::table(open_session_section(data)),
            PdfPage::charted(after_hours_section(data, slot_plan), after_hours_chart),
            PdfPage::table(congestion_section(data, slot_plan)),
        ],
    }
}
