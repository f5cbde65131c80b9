// ==========================================
// 展会访客分析导出 - 导出 API
// ==========================================
// 职责: 面向路由层的异步报表生成入口
// 约束: 报表生成（SQLite 查询 + 渲染）在阻塞线程池执行，不占用异步工作线程
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::types::{ReportFormat, ReportKind, ReportParams};
use crate::report::ReportGenerator;

/// 单个已生成的报表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedReport {
    pub kind: ReportKind,
    pub format: ReportFormat,
    pub day: u32,
    pub path: PathBuf,
    pub content_type: &'static str,
}

/// 支持的全部 (报表类型, 格式) 组合，按导出面板顺序
pub fn supported_pairs() -> Vec<(ReportKind, ReportFormat)> {
    ReportKind::ALL
        .iter()
        .flat_map(|kind| kind.supported_formats().iter().map(move |format| (*kind, *format)))
        .collect()
}

// ==========================================
// ExportApi - 导出 API
// ==========================================
#[derive(Clone)]
pub struct ExportApi {
    generator: Arc<ReportGenerator>,
    exhibition_days: u32,
}

impl ExportApi {
    pub fn new(generator: Arc<ReportGenerator>, exhibition_days: u32) -> Self {
        Self {
            generator,
            exhibition_days,
        }
    }

    pub fn exhibition_days(&self) -> u32 {
        self.exhibition_days
    }

    /// 生成单个报表
    pub async fn generate(
        &self,
        kind: ReportKind,
        format: ReportFormat,
        params: ReportParams,
    ) -> ApiResult<GeneratedReport> {
        validator::validate_pair(kind, format)?;
        let day = validator::validate_day_range(params.day, self.exhibition_days)?;

        let generator = Arc::clone(&self.generator);
        let path = tokio::task::spawn_blocking(move || generator.generate(kind, format, &params))
            .await
            .map_err(|e| ApiError::InternalError(format!("报表任务异常退出: {}", e)))??;

        Ok(GeneratedReport {
            kind,
            format,
            day,
            path,
            content_type: format.content_type(),
        })
    }

    /// 路由参数形式的入口: /export/{report}/{format}?day=&overstay_minutes=&congestion_threshold=
    pub async fn generate_from_route(
        &self,
        report: &str,
        format: &str,
        day: &str,
        overstay_minutes: Option<&str>,
        congestion_threshold: Option<&str>,
    ) -> ApiResult<GeneratedReport> {
        let kind = validator::parse_kind(report)?;
        let format = validator::parse_format(format)?;
        let params = validator::parse_report_params(
            day,
            overstay_minutes,
            congestion_threshold,
            self.exhibition_days,
        )?;
        self.generate(kind, format, params).await
    }

    /// 并发生成当日全部报表（六个文件）
    ///
    /// 单个报表失败不影响其他报表，结果顺序与 supported_pairs 一致
    pub async fn generate_all(&self, day: i64) -> ApiResult<Vec<ApiResult<GeneratedReport>>> {
        validator::validate_day_range(day, self.exhibition_days)?;

        let params = ReportParams::for_day(day);
        let tasks = supported_pairs()
            .into_iter()
            .map(|(kind, format)| self.generate(kind, format, params));
        let results = join_all(tasks).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(day = day, total = results.len(), failed = failed, "批量导出完成");
        Ok(results)
    }
}
