// ==========================================
// 展会访客分析导出 - 报表层错误类型
// ==========================================
// 约束: 空结果不是错误；图表渲染失败在 PDF 渲染内部降级，不向上传播
// ==========================================

use thiserror::Error;

use crate::report::file_sink::SinkError;
use crate::repository::error::RepositoryError;

#[derive(Error, Debug)]
pub enum ReportError {
    /// 请求参数非法（展会日、报表类型/格式组合）
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 数据源不可用（查询失败、连接获取超时）
    #[error("数据不可用: {0}")]
    DataUnavailable(String),

    /// 文档编码失败（CSV/PDF）
    #[error("报表渲染失败: {0}")]
    RenderFailure(String),

    #[error("报表落盘失败: {0}")]
    Sink(#[from] SinkError),
}

impl From<RepositoryError> for ReportError {
    fn from(err: RepositoryError) -> Self {
        ReportError::DataUnavailable(err.to_string())
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
