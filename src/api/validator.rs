// ==========================================
// 展会访客分析导出 - 请求参数校验
// ==========================================
// 职责: 路由参数（文本）-> 类型化的报表请求
// 约束: 展会日只接受 1..=exhibition_days；阈值只接受非负整数
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::{ReportFormat, ReportKind, ReportParams};
use crate::engine::day_resolver::parse_day_number;

/// 展会日越界时的提示文本
pub fn invalid_day_message(exhibition_days: u32) -> String {
    format!("Invalid day. Allowed values are 1-{}.", exhibition_days)
}

pub fn validate_day_range(day: i64, exhibition_days: u32) -> ApiResult<u32> {
    if day < 1 || day > i64::from(exhibition_days) {
        return Err(ApiError::InvalidInput(invalid_day_message(exhibition_days)));
    }
    // 已确认 1 <= day <= u32::MAX
    Ok(day as u32)
}

/// 解析路由中的展会日文本（"3"、"3.0" 可接受）
pub fn parse_day(raw: &str, exhibition_days: u32) -> ApiResult<u32> {
    let day = parse_day_number(raw).ok_or_else(|| ApiError::InvalidInput(invalid_day_message(exhibition_days)))?;
    validate_day_range(day, exhibition_days)
}

/// 解析可选阈值；空文本视为未提供
pub fn parse_threshold(name: &str, raw: Option<&str>) -> ApiResult<Option<u32>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ApiError::InvalidInput(format!("{} 必须为非负整数: {}", name, text))),
    }
}

pub fn parse_kind(raw: &str) -> ApiResult<ReportKind> {
    ReportKind::parse(raw).ok_or_else(|| ApiError::InvalidInput(format!("未知报表类型: {}", raw)))
}

pub fn parse_format(raw: &str) -> ApiResult<ReportFormat> {
    ReportFormat::parse(raw).ok_or_else(|| ApiError::InvalidInput(format!("未知输出格式: {}", raw)))
}

/// 报表类型 + 格式组合校验
pub fn validate_pair(kind: ReportKind, format: ReportFormat) -> ApiResult<()> {
    if kind.supports(format) {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!("报表 {} 不支持 {} 格式", kind, format)))
    }
}

/// 组装报表请求参数
pub fn parse_report_params(
    day: &str,
    overstay_minutes: Option<&str>,
    congestion_threshold: Option<&str>,
    exhibition_days: u32,
) -> ApiResult<ReportParams> {
    let day = parse_day(day, exhibition_days)?;
    Ok(ReportParams {
        day: i64::from(day),
        overstay_minutes: parse_threshold("overstay_minutes", overstay_minutes)?,
        congestion_threshold: parse_threshold("congestion_threshold", congestion_threshold)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_range() {
        assert_eq!(validate_day_range(1, 5).unwrap(), 1);
        assert_eq!(validate_day_range(5, 5).unwrap(), 5);
        for bad in [0, -1, 6, 99] {
            let err = validate_day_range(bad, 5).unwrap_err();
            assert_eq!(err.to_string(), "无效输入: Invalid day. Allowed values are 1-5.");
        }
    }

    #[test]
    fn test_parse_day_text() {
        assert_eq!(parse_day("3", 5).unwrap(), 3);
        assert_eq!(parse_day(" 2.0 ", 5).unwrap(), 2);
        assert!(parse_day("abc", 5).is_err());
        assert!(parse_day("2.5", 5).is_err());
        assert!(parse_day("", 5).is_err());
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("t", None).unwrap(), None);
        assert_eq!(parse_threshold("t", Some(" ")).unwrap(), None);
        assert_eq!(parse_threshold("t", Some("90")).unwrap(), Some(90));
        assert!(matches!(
            parse_threshold("t", Some("-5")),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(parse_threshold("t", Some("ten")).is_err());
    }

    #[test]
    fn test_parse_report_params_and_pair() {
        let params = parse_report_params("2", Some("60"), None, 5).unwrap();
        assert_eq!(params.day, 2);
        assert_eq!(params.overstay_minutes, Some(60));
        assert_eq!(params.congestion_threshold, None);

        assert!(validate_pair(ReportKind::Attendance, ReportFormat::Csv).is_ok());
        assert!(validate_pair(ReportKind::EventSummary, ReportFormat::Csv).is_err());
        assert!(parse_kind("heatmap").is_err());
        assert!(parse_format("xlsx").is_err());
    }
}
