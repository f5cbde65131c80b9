// ==========================================
// 展会访客分析导出 - 应用层
// ==========================================
// 职责: 组装共享状态，供 CLI / 路由层使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
