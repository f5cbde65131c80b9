// ==========================================
// 展会访客分析导出 - API层错误类型
// ==========================================
// 职责: 把报表层错误收敛为调用方可区分的四类错误
// 约束: 参数错误与数据源错误必须可区分（调用方据此决定 4xx / 5xx）
// ==========================================

use crate::report::error::ReportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据不可用: {0}")]
    DataUnavailable(String),

    #[error("报表渲染失败: {0}")]
    RenderFailure(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// HTTP 状态码映射（供外层路由使用）
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidInput(_) => 400,
            ApiError::DataUnavailable(_) => 503,
            ApiError::RenderFailure(_) | ApiError::InternalError(_) => 500,
        }
    }
}

// ==========================================
// 从 ReportError 转换
// ==========================================
impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            ReportError::DataUnavailable(msg) => ApiError::DataUnavailable(msg),
            ReportError::RenderFailure(msg) => ApiError::RenderFailure(msg),
            ReportError::Sink(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
