// ==========================================
// 展会访客分析导出 - 命令行入口
// ==========================================
// 用法:
//   exhibition-export <db_path> <report> <format> <day>
//   exhibition-export <db_path> all <day>
// day 可为 today（按展会起始日期换算当天）
// db_path 为 "-" 时使用默认路径
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::Local;

use exhibition_export::api::GeneratedReport;
use exhibition_export::app::{get_default_db_path, AppState};
use exhibition_export::logging;

/// 设置为 json 时输出 JSON 日志
const LOG_FORMAT_ENV: &str = "EXHIBITION_EXPORT_LOG_FORMAT";

const USAGE: &str = "用法: exhibition-export <db_path> <report> <format> <day>\n      exhibition-export <db_path> all <day>";

fn resolve_db_path(raw: &str) -> String {
    if raw == "-" {
        get_default_db_path()
    } else {
        raw.to_string()
    }
}

/// "today" -> 当天对应的展会日
fn resolve_day_arg(state: &AppState, raw: &str) -> Result<String> {
    if !raw.eq_ignore_ascii_case("today") {
        return Ok(raw.to_string());
    }
    let today = Local::now().date_naive();
    match state.config.day_resolver().day_for_date(today) {
        Some(day) => Ok(day.to_string()),
        None => bail!("展会尚未开始（起始日期 {}）", state.config.start_date),
    }
}

fn print_report(report: &GeneratedReport) {
    println!("{}\t{}\t{}", report.kind, report.format, report.path.display());
}

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(v) if v.eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!("{}", USAGE);
    }

    let db_path = resolve_db_path(&args[0]);
    tracing::info!(
        app = exhibition_export::APP_NAME,
        version = exhibition_export::VERSION,
        db_path = %db_path,
        "启动"
    );

    let state = AppState::new(db_path).map_err(anyhow::Error::msg).context("初始化失败")?;
    let api = state.export_api.clone();

    if args[1].eq_ignore_ascii_case("all") {
        let day_arg = resolve_day_arg(&state, &args[2])?;
        let day: i64 = day_arg
            .trim()
            .parse()
            .with_context(|| format!("展会日非法: {}", day_arg))?;

        let mut failed = 0usize;
        for result in api.generate_all(day).await? {
            match result {
                Ok(report) => print_report(&report),
                Err(e) => {
                    failed += 1;
                    eprintln!("失败: {}", e);
                }
            }
        }
        if failed > 0 {
            bail!("{} 个报表生成失败", failed);
        }
        return Ok(());
    }

    if args.len() < 4 {
        bail!("{}", USAGE);
    }
    let day_arg = resolve_day_arg(&state, &args[3])?;
    let report = api
        .generate_from_route(&args[1], &args[2], &day_arg, None, None)
        .await?;
    print_report(&report);
    Ok(())
}
