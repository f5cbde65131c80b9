// ==========================================
// 展会访客分析导出 - SQL 构建工具
// ==========================================
// 职责: 聚合查询的链式 SQL 拼装（WHERE / GROUP BY / HAVING / ORDER BY / LIMIT）
// 约束: 只拼装结构，取值一律走参数绑定
// ==========================================

/// 生成 n 个位置占位符: "?1, ?2, ..."，从 start 开始编号
pub fn numbered_placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQL 查询构建器（流式 API）
///
/// # 示例
/// ```
/// use exhibition_export::repository::sql_builder::SqlQueryBuilder;
///
/// let sql = SqlQueryBuilder::new("SELECT zone, COUNT(*) AS visits FROM entry_exit_log")
///     .where_clause("date(entry_time) = ?1")
///     .group_by("zone")
///     .order_by("visits DESC")
///     .limit(10)
///     .build();
///
/// assert!(sql.contains("WHERE date(entry_time) = ?1"));
/// assert!(sql.ends_with("ORDER BY visits DESC LIMIT 10"));
/// ```
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    select_clause: String,
    where_clauses: Vec<String>,
    group_by_clause: Option<String>,
    having_clause: Option<String>,
    order_by_clause: Option<String>,
    limit_clause: Option<String>,
}

impl SqlQueryBuilder {
    /// 创建新的 SQL 查询构建器
    pub fn new(select: &str) -> Self {
        Self {
            select_clause: select.trim().to_string(),
            where_clauses: Vec::new(),
            group_by_clause: None,
            having_clause: None,
            order_by_clause: None,
            limit_clause: None,
        }
    }

    /// 添加 WHERE 条件（多个条件以 AND 连接）
    pub fn where_clause(mut self, condition: &str) -> Self {
        self.where_clauses.push(condition.to_string());
        self
    }

    /// 条件添加 AND 子句
    pub fn and_if(mut self, condition: Option<&str>) -> Self {
        if let Some(cond) = condition {
            self.where_clauses.push(cond.to_string());
        }
        self
    }

    pub fn group_by(mut self, columns: &str) -> Self {
        self.group_by_clause = Some(columns.to_string());
        self
    }

    pub fn having(mut self, condition: &str) -> Self {
        self.having_clause = Some(condition.to_string());
        self
    }

    /// 添加 ORDER BY 子句
    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by_clause = Some(order.to_string());
        self
    }

    /// 固定数值 LIMIT
    pub fn limit(mut self, n: usize) -> Self {
        self.limit_clause = Some(n.to_string());
        self
    }

    /// 参数化 LIMIT，例如 "?2"
    pub fn limit_param(mut self, placeholder: &str) -> Self {
        self.limit_clause = Some(placeholder.to_string());
        self
    }

    /// 构建最终的 SQL 语句
    pub fn build(&self) -> String {
        let mut sql = self.select_clause.clone();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(group) = &self.group_by_clause {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }

        if let Some(having) = &self.having_clause {
            sql.push_str(" HAVING ");
            sql.push_str(having);
        }

        if let Some(order) = &self.order_by_clause {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = &self.limit_clause {
            sql.push_str(" LIMIT ");
            sql.push_str(limit);
        }

        sql
    }
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_full_clause_order() {
        let sql = SqlQueryBuilder::new("SELECT tag_id, COUNT(*) AS visits FROM entry_exit_log")
            .where_clause("date(entry_time) = ?1")
            .group_by("tag_id")
            .having("COUNT(*) > 1")
            .order_by("visits DESC, tag_id ASC")
            .limit_param("?2")
            .build();

        assert_eq!(
            sql,
            "SELECT tag_id, COUNT(*) AS visits FROM entry_exit_log WHERE date(entry_time) = ?1 \
             GROUP BY tag_id HAVING COUNT(*) > 1 ORDER BY visits DESC, tag_id ASC LIMIT ?2"
        );
    }

    #[test]
    fn test_builder_without_optional_clauses() {
        let sql = SqlQueryBuilder::new("SELECT 1").build();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn test_and_if() {
        let sql = SqlQueryBuilder::new("SELECT * FROM building")
            .where_clause("dept_name IS NOT NULL")
            .and_if(Some("building_id = ?1"))
            .and_if(None)
            .build();
        assert_eq!(
            sql,
            "SELECT * FROM building WHERE dept_name IS NOT NULL AND building_id = ?1"
        );
    }

    #[test]
    fn test_numbered_placeholders() {
        assert_eq!(numbered_placeholders(1, 3), "?1, ?2, ?3");
        assert_eq!(numbered_placeholders(2, 1), "?2");
        assert_eq!(numbered_placeholders(1, 0), "");
    }
}
