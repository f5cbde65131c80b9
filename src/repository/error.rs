// ==========================================
// 展会访客分析导出 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 空结果不是错误，返回空集合
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接/资源错误 =====
    #[error("数据库连接获取超时: 等待 {waited_ms}ms 后仍无法获取连接")]
    ConnectionTimeout { waited_ms: u64 },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ===== 查询错误 =====
    #[error("数据库查询失败 (query={query}): {message}")]
    DatabaseQueryError { query: String, message: String },

    #[error("查询结果类型不匹配: 期望 {expected}, 实际 {actual}")]
    UnexpectedRowSet {
        expected: &'static str,
        actual: &'static str,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl RepositoryError {
    pub fn query(query: &str, err: impl std::fmt::Display) -> Self {
        RepositoryError::DatabaseQueryError {
            query: query.to_string(),
            message: err.to_string(),
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                RepositoryError::DatabaseConnectionError(
                    msg.unwrap_or_else(|| code.to_string()),
                )
            }
            rusqlite::Error::SqliteFailure(code, Some(msg)) => RepositoryError::DatabaseQueryError {
                query: format!("{:?}", code.code),
                message: msg,
            },
            _ => RepositoryError::DatabaseQueryError {
                query: "unknown".to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
