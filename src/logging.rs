// ==========================================
// 展会访客分析导出 - 日志
// ==========================================
// 职责: 安装 tracing 订阅器（文本 / JSON / 测试三种输出）
// 级别: RUST_LOG 优先，未设置时使用各入口的默认级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认级别；rusqlite 的 trace 输出压到 warn，避免淹没报表日志
const DEFAULT_DIRECTIVES: &str = "info,rusqlite=warn";

fn filter_or(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// 文本日志（命令行默认）
///
/// # 环境变量
/// - RUST_LOG: 例如 RUST_LOG=exhibition_export::report=debug
///
/// # 示例
/// ```no_run
/// use exhibition_export::logging;
/// logging::init();
/// ```
pub fn init() {
    let _ = fmt()
        .with_env_filter(filter_or(DEFAULT_DIRECTIVES))
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// JSON 日志，每条一行，字段与文本日志相同
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(filter_or(DEFAULT_DIRECTIVES))
        .with_current_span(false)
        .try_init();
}

/// 测试用：debug 级别，输出交给 libtest 捕获；重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(filter_or("debug"))
        .with_test_writer()
        .try_init();
}
