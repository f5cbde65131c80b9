// ==========================================
// 展会访客分析导出 - API 层
// ==========================================
// 职责: 参数校验 + 异步报表生成，供路由层/CLI 调用
// ==========================================

pub mod error;
pub mod export_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use export_api::{supported_pairs, ExportApi, GeneratedReport};
