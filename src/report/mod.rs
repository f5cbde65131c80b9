// ==========================================
// 展会访客分析导出 - 报表层
// ==========================================
// 流程: 解析展会日 -> 聚合查询 -> 组装文档 -> 渲染 CSV/PDF -> 原子落盘
// ==========================================

pub mod attendance;
pub mod chart;
pub mod csv_render;
pub mod error;
pub mod event_summary;
pub mod file_sink;
pub mod movement;
pub mod pdf_render;
pub mod security;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;

use crate::config::ExportConfig;
use crate::domain::types::{ReportFormat, ReportKind, ReportParams, ResolvedDay};
use crate::engine::DayResolver;
use crate::repository::{AggregateQuerySet, QueryExecutor};

pub use chart::ChartRenderer;
pub use error::{ReportError, ReportResult};
pub use file_sink::FileSink;

/// 报表组装参数（列表条数与默认阈值）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSettings {
    pub busiest_limit: usize,
    pub transition_limit: usize,
    pub repeat_visitor_limit: usize,
    pub overstay_minutes: u32,
    pub congestion_threshold: u32,
}

impl From<&ExportConfig> for ReportSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            busiest_limit: config.busiest_limit,
            transition_limit: config.transition_limit,
            repeat_visitor_limit: config.repeat_visitor_limit,
            overstay_minutes: config.overstay_minutes,
            congestion_threshold: config.congestion_threshold,
        }
    }
}

// ==========================================
// ReportGenerator - 报表生成器
// ==========================================
// 无内部可变状态，可在多个任务间共享
pub struct ReportGenerator {
    queries: AggregateQuerySet,
    resolver: DayResolver,
    sink: FileSink,
    charts: ChartRenderer,
    settings: ReportSettings,
}

impl ReportGenerator {
    pub fn new(
        queries: AggregateQuerySet,
        resolver: DayResolver,
        sink: FileSink,
        charts: ChartRenderer,
        settings: ReportSettings,
    ) -> Self {
        Self {
            queries,
            resolver,
            sink,
            charts,
            settings,
        }
    }

    pub fn from_config(executor: Arc<dyn QueryExecutor>, config: &ExportConfig) -> Self {
        Self::new(
            AggregateQuerySet::new(executor, config.slot_plan()),
            config.day_resolver(),
            FileSink::new(config.output_dir.clone()),
            ChartRenderer::default(),
            ReportSettings::from(config),
        )
    }

    /// 替换图表渲染器（尺寸）
    pub fn with_charts(mut self, charts: ChartRenderer) -> Self {
        self.charts = charts;
        self
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    pub fn sink(&self) -> &FileSink {
        &self.sink
    }

    pub fn resolve_day(&self, day: i64) -> ReportResult<ResolvedDay> {
        self.resolver
            .resolve(day)
            .ok_or_else(|| ReportError::InvalidInput(format!("展会日非法: {}", day)))
    }

    fn write(&self, kind: ReportKind, format: ReportFormat, day: &ResolvedDay, bytes: &[u8]) -> ReportResult<PathBuf> {
        let suffix = file_sink::unique_suffix(day, Local::now().naive_local());
        let file_name = file_sink::report_file_name(kind, format, day, &suffix);
        Ok(self.sink.write(bytes, &file_name)?)
    }

    // ===== 出勤与使用 =====

    pub fn attendance_csv(&self, day: i64) -> ReportResult<PathBuf> {
        let day = self.resolve_day(day)?;
        let data = attendance::collect(&self.queries, &day, self.settings.repeat_visitor_limit)?;
        let text = csv_render::render_csv(&attendance::build_csv(&data))?;
        self.write(ReportKind::Attendance, ReportFormat::Csv, &day, text.as_bytes())
    }

    pub fn attendance_pdf(&self, day: i64) -> ReportResult<PathBuf> {
        let day = self.resolve_day(day)?;
        let data = attendance::collect(&self.queries, &day, self.settings.repeat_visitor_limit)?;
        let bytes = pdf_render::render_pdf(&attendance::build_pdf(&data, self.queries.slots()), &self.charts)?;
        self.write(ReportKind::Attendance, ReportFormat::Pdf, &day, &bytes)
    }

    // ===== 人流动线 =====

    fn movement_data(&self, day: &ResolvedDay) -> ReportResult<movement::MovementData> {
        Ok(movement::collect(
            &self.queries,
            day,
            self.settings.transition_limit,
            self.settings.busiest_limit,
        )?)
    }

    pub fn movement_csv(&self, day: i64) -> ReportResult<PathBuf> {
        let day = self.resolve_day(day)?;
        let data = self.movement_data(&day)?;
        let text = csv_render::render_csv(&movement::build_csv(&data))?;
        self.write(ReportKind::Movement, ReportFormat::Csv, &day, text.as_bytes())
    }

    pub fn movement_pdf(&self, day: i64) -> ReportResult<PathBuf> {
        let day = self.resolve_day(day)?;
        let data = self.movement_data(&day)?;
        let bytes = pdf_render::render_pdf(&movement::build_pdf(&data, self.queries.slots()), &self.charts)?;
        self.write(ReportKind::Movement, ReportFormat::Pdf, &day, &bytes)
    }

    // ===== 安全与异常 =====

    /// 阈值为 None 时使用配置默认值
    pub fn security_pdf(
        &self,
        day: i64,
        overstay_minutes: Option<u32>,
        congestion_threshold: Option<u32>,
    ) -> ReportResult<PathBuf> {
        let day = self.resolve_day(day)?;
        let data = security::collect(
            &self.queries,
            &day,
            overstay_minutes.unwrap_or(self.settings.overstay_minutes),
            congestion_threshold.unwrap_or(self.settings.congestion_threshold),
        )?;
        let bytes = pdf_render::render_pdf(&security::build_pdf(&data, self.queries.slots()), &self.charts)?;
        self.write(ReportKind::Security, ReportFormat::Pdf, &day, &bytes)
    }

    // ===== 活动汇总 =====

    pub fn event_summary_pdf(&self, day: i64) -> ReportResult<PathBuf> {
        let day = self.resolve_day(day)?;
        let data = event_summary::collect(&self.queries, &day, self.resolver.start_date())?;
        let bytes = pdf_render::render_pdf(&event_summary::build_pdf(&data), &self.charts)?;
        self.write(ReportKind::EventSummary, ReportFormat::Pdf, &day, &bytes)
    }

    /// 按 (报表类型, 格式) 分派
    pub fn generate(&self, kind: ReportKind, format: ReportFormat, params: &ReportParams) -> ReportResult<PathBuf> {
        if !kind.supports(format) {
            return Err(ReportError::InvalidInput(format!(
                "报表 {} 不支持 {} 格式",
                kind, format
            )));
        }

        let started = Instant::now();
        let result = match (kind, format) {
            (ReportKind::Attendance, ReportFormat::Csv) => self.attendance_csv(params.day),
            (ReportKind::Attendance, ReportFormat::Pdf) => self.attendance_pdf(params.day),
            (ReportKind::Movement, ReportFormat::Csv) => self.movement_csv(params.day),
            (ReportKind::Movement, ReportFormat::Pdf) => self.movement_pdf(params.day),
            (ReportKind::Security, _) => {
                self.security_pdf(params.day, params.overstay_minutes, params.congestion_threshold)
            }
            (ReportKind::EventSummary, _) => self.event_summary_pdf(params.day),
        };

        match &result {
            Ok(path) => tracing::info!(
                report = %kind,
                format = %format,
                day = params.day,
                path = %path.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "报表生成完成"
            ),
            Err(e) => tracing::warn!(
                report = %kind,
                format = %format,
                day = params.day,
                error = %e,
                "报表生成失败"
            ),
        }
        result
    }
}
