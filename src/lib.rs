// ==========================================
// 展会访客分析导出 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + plotters + pdf-writer
// 系统定位: 按展会日生成 CSV / PDF 分析报表
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 行结构、报表文档模型
pub mod domain;

// 数据仓储层 - 聚合查询
pub mod repository;

// 引擎层 - 展会日解析
pub mod engine;

// 配置层 - 导出配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 报表层 - 组装、渲染、落盘
pub mod report;

// API 层 - 参数校验与异步导出
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::types::{ReportFormat, ReportKind, ReportParams, ResolvedDay, SlotPlan};
pub use engine::DayResolver;
pub use report::{ReportError, ReportGenerator, ReportResult};
pub use repository::{AggregateQuery, QueryExecutor, RepositoryError, SqliteQueryExecutor};
pub use api::{ApiError, ExportApi, GeneratedReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "展会访客分析导出";
