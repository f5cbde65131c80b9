// ==========================================
// 展会访客分析导出 - 数据仓储层
// ==========================================
// 红线: Repository 不含报表逻辑
// ==========================================
// 职责: 聚合查询意图、执行器接口与 SQLite 实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod executor;
pub mod queries;
pub mod query_set;
pub mod sql_builder;
pub mod sqlite_executor;

pub use error::{RepositoryError, RepositoryResult};
pub use executor::{AggregateQuery, QueryExecutor};
pub use query_set::AggregateQuerySet;
pub use sqlite_executor::SqliteQueryExecutor;
