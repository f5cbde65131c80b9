// ==========================================
// 展会访客分析导出 - 报表落盘
// ==========================================
// 职责: 生成报表文件名，原子写入输出目录并返回绝对路径
// 约束: 先写同目录临时文件再 persist_noclobber，目标路径上不会出现半成品，
//       也不会覆盖已有文件
// ==========================================

use chrono::NaiveDateTime;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::types::{ReportFormat, ReportKind, ResolvedDay};

/// 临时文件前缀（清理残留时可按前缀识别）
pub const PARTIAL_PREFIX: &str = ".partial-";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("文件名非法: {0}")]
    InvalidFileName(String),

    #[error("创建输出目录失败: {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("写入文件失败: {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("目标文件已存在: {0}")]
    AlreadyExists(PathBuf),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// 文件名后缀: <日期>_<YYYYMMDDHHMMSS>_<8位随机十六进制>
pub fn unique_suffix(day: &ResolvedDay, generated_at: NaiveDateTime) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        day.date_str(),
        generated_at.format("%Y%m%d%H%M%S"),
        &token[..8]
    )
}

/// 报表文件名（下游按前缀识别报表类型，格式不可修改）
///
/// - attendance_usage_<suffix>.csv / .pdf
/// - movement_flow_day<day>_<suffix>.csv，movement_flow_<suffix>.pdf
/// - security_exception_<suffix>.pdf
/// - event_summary_<day>_<suffix>.pdf
pub fn report_file_name(kind: ReportKind, format: ReportFormat, day: &ResolvedDay, suffix: &str) -> String {
    let stem = match (kind, format) {
        (ReportKind::Movement, ReportFormat::Csv) => {
            format!("{}_day{}_{}", kind.file_prefix(), day.day, suffix)
        }
        (ReportKind::EventSummary, _) => format!("{}_{}_{}", kind.file_prefix(), day.day, suffix),
        _ => format!("{}_{}", kind.file_prefix(), suffix),
    };
    format!("{}.{}", stem, format.extension())
}

fn validate_file_name(file_name: &str) -> SinkResult<()> {
    let invalid = file_name.trim().is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name == "."
        || file_name == ".."
        || file_name.starts_with(PARTIAL_PREFIX);
    if invalid {
        return Err(SinkError::InvalidFileName(file_name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 写入报表文件，返回绝对路径
    pub fn write(&self, bytes: &[u8], file_name: &str) -> SinkResult<PathBuf> {
        write_file(bytes, &self.output_dir, file_name)
    }
}

/// 原子写入 dir/file_name
///
/// 目录不存在时创建（并发创建同一目录不报错）
pub fn write_file(bytes: &[u8], dir: &Path, file_name: &str) -> SinkResult<PathBuf> {
    validate_file_name(file_name)?;

    fs::create_dir_all(dir).map_err(|source| SinkError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let dir = dir.canonicalize().map_err(|source| SinkError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let target = dir.join(file_name);

    let mut tmp = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .tempfile_in(&dir)
        .map_err(|source| SinkError::Write {
            path: target.clone(),
            source,
        })?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|source| SinkError::Write {
            path: target.clone(),
            source,
        })?;

    tmp.persist_noclobber(&target).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            SinkError::AlreadyExists(target.clone())
        } else {
            SinkError::Write {
                path: target.clone(),
                source: e.error,
            }
        }
    })?;

    tracing::info!(path = %target.display(), bytes = bytes.len(), "报表文件已写入");
    Ok(target)
}

/// 删除已下发的报表文件（文件不存在视为成功）
pub fn cleanup(path: &Path) -> SinkResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "报表文件已清理");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SinkError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(n: u32, d: u32) -> ResolvedDay {
        ResolvedDay {
            day: n,
            date: NaiveDate::from_ymd_opt(2025, 10, d).unwrap(),
        }
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 30)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_unique_suffix_format() {
        let suffix = unique_suffix(&day(3, 30), generated_at());
        let parts: Vec<&str> = suffix.split('_').collect();
        assert_eq!(parts[0], "2025-10-30");
        assert_eq!(parts[1], "20251030090507");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(suffix, unique_suffix(&day(3, 30), generated_at()));
    }

    #[test]
    fn test_report_file_names() {
        let d = day(2, 29);
        let s = "2025-10-29_20251029100000_abcdef01";
        assert_eq!(
            report_file_name(ReportKind::Attendance, ReportFormat::Csv, &d, s),
            format!("attendance_usage_{}.csv", s)
        );
        assert_eq!(
            report_file_name(ReportKind::Movement, ReportFormat::Csv, &d, s),
            format!("movement_flow_day2_{}.csv", s)
        );
        assert_eq!(
            report_file_name(ReportKind::Movement, ReportFormat::Pdf, &d, s),
            format!("movement_flow_{}.pdf", s)
        );
        assert_eq!(
            report_file_name(ReportKind::Security, ReportFormat::Pdf, &d, s),
            format!("security_exception_{}.pdf", s)
        );
        assert_eq!(
            report_file_name(ReportKind::EventSummary, ReportFormat::Pdf, &d, s),
            format!("event_summary_2_{}.pdf", s)
        );
    }

    #[test]
    fn test_write_creates_dir_and_returns_absolute_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("exports");
        let sink = FileSink::new(&dir);

        let path = sink.write(b"hello", "report.csv").unwrap();
        assert!(path.is_absolute());
        assert_eq!(fs::read(&path).unwrap(), b"hello");

        // 目录中不残留临时文件
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(PARTIAL_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path());
        sink.write(b"first", "same.pdf").unwrap();

        let err = sink.write(b"second", "same.pdf").unwrap_err();
        assert!(matches!(err, SinkError::AlreadyExists(_)));
        assert_eq!(fs::read(tmp.path().join("same.pdf")).unwrap(), b"first");
    }

    #[test]
    fn test_write_rejects_path_components() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmp.path());
        assert!(matches!(
            sink.write(b"x", "../escape.csv"),
            Err(SinkError::InvalidFileName(_))
        ));
        assert!(matches!(sink.write(b"x", ""), Err(SinkError::InvalidFileName(_))));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = FileSink::new(tmp.path()).write(b"x", "gone.csv").unwrap();
        cleanup(&path).unwrap();
        assert!(!path.exists());
        cleanup(&path).unwrap();
    }
}
