// ==========================================
// 展会访客分析导出 - 领域模型层
// ==========================================
// 职责: 展会日、聚合行结构、报表文档模型
// 红线: 不含数据访问逻辑,不含渲染逻辑
// ==========================================

pub mod document;
pub mod rows;
pub mod types;

pub use document::{CellValue, ChartKind, ChartSpec, Column, CsvDocument, PdfDocument, ReportSection};
pub use rows::{BuildingLookup, BuildingName, RowSet};
pub use types::{ReportFormat, ReportKind, ReportParams, ResolvedDay, SlotPlan, TimeSlot};
