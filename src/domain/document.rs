// ==========================================
// 展会访客分析导出 - 报表文档模型
// ==========================================
// 职责: 报表分节 (ReportSection)、CSV/PDF 文档结构、图表描述 (ChartSpec)
// 约束: 分节顺序即版面顺序，相同输入必须得到相同顺序
// ==========================================

use serde::{Deserialize, Serialize};

/// 无数据分节的占位文本
pub const NO_DATA: &str = "No data";

/// 缺失值的展示文本
pub const NOT_AVAILABLE: &str = "N/A";

// ==========================================
// 单元格与列
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Null,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn opt_float(value: Option<f64>) -> Self {
        value.map(CellValue::Float).unwrap_or(CellValue::Null)
    }

    pub fn opt_int(value: Option<i64>) -> Self {
        value.map(CellValue::Int).unwrap_or(CellValue::Null)
    }

    pub fn opt_text(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Null)
    }
}

/// 列格式化器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellFormat {
    /// 原样输出
    Text,
    /// 整数计数
    Count,
    /// 小数（最多两位，至少保留一位）
    Decimal,
    /// 小时 -> "HH:00"
    Hour,
}

impl CellFormat {
    pub fn apply(&self, value: &CellValue) -> String {
        match (self, value) {
            (_, CellValue::Null) => NOT_AVAILABLE.to_string(),
            (_, CellValue::Text(s)) => s.clone(),
            (CellFormat::Hour, CellValue::Int(h)) => format!("{:02}:00", h),
            (CellFormat::Decimal, CellValue::Int(n)) => format_decimal(*n as f64),
            (_, CellValue::Int(n)) => n.to_string(),
            (CellFormat::Count, CellValue::Float(f)) => format!("{:.0}", f),
            (CellFormat::Hour, CellValue::Float(f)) => format!("{:02}:00", f.trunc() as i64),
            (_, CellValue::Float(f)) => format_decimal(*f),
        }
    }

    /// 数值列在 PDF 表格中右对齐
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellFormat::Count | CellFormat::Decimal)
    }
}

/// 两位小数，去掉多余的尾零，至少保留一位小数（42.50 -> 42.5，30.00 -> 30.0）
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let mut s = format!("{:.2}", value);
    while s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    if s == "-0.0" {
        s = "0.0".to_string();
    }
    s
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub format: CellFormat,
}

impl Column {
    pub fn new(name: impl Into<String>, format: CellFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, CellFormat::Text)
    }

    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, CellFormat::Count)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, CellFormat::Decimal)
    }

    pub fn hour(name: impl Into<String>) -> Self {
        Self::new(name, CellFormat::Hour)
    }
}

// ==========================================
// ReportSection - 报表分节
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
    /// 附注（例如图表降级说明）
    pub note: Option<String>,
}

impl ReportSection {
    pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
            note: None,
        }
    }

    /// 追加一行；列数不足时补空值，多出的值丢弃
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn with_rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        for row in rows {
            self.push_row(row);
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// 按列格式化后的行；无数据时返回单行 "No data"
    pub fn formatted_rows(&self) -> Vec<Vec<String>> {
        if self.rows.is_empty() {
            let mut row = vec![String::new(); self.columns.len().max(1)];
            row[0] = NO_DATA.to_string();
            return vec![row];
        }

        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(col, cell)| col.format.apply(cell))
                    .collect()
            })
            .collect()
    }
}

// ==========================================
// 文档
// ==========================================

/// CSV 文档：扁平的分节序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvDocument {
    pub sections: Vec<ReportSection>,
}

impl CsvDocument {
    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }
}

/// PDF 封面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitlePage {
    pub title: String,
    pub subtitle: String,
    /// 封面上的键值对（日期、阈值、关键合计等）
    pub facts: Vec<(String, String)>,
}

/// PDF 单页：若干分节 + 至多一张图表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfPage {
    pub heading: String,
    pub chart: Option<ChartSpec>,
    pub sections: Vec<ReportSection>,
}

impl PdfPage {
    pub fn table(section: ReportSection) -> Self {
        Self {
            heading: section.title.clone(),
            chart: None,
            sections: vec![section],
        }
    }

    pub fn charted(section: ReportSection, chart: ChartSpec) -> Self {
        Self {
            heading: section.title.clone(),
            chart: Some(chart),
            sections: vec![section],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    pub title_page: TitlePage,
    pub pages: Vec<PdfPage>,
}

impl PdfDocument {
    pub fn page_headings(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.heading.as_str()).collect()
    }
}

// ==========================================
// ChartSpec - 图表描述
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub bucket: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub label: String,
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    pub fn new(label: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            label: label.into(),
            kind,
            points: Vec::new(),
        }
    }

    pub fn with_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.points.extend(points.into_iter().map(|(bucket, value)| ChartPoint {
            bucket: bucket.into(),
            value,
        }));
        self
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(42.5), "42.5");
        assert_eq!(format_decimal(30.0), "30.0");
        assert_eq!(format_decimal(2.456), "2.46");
        assert_eq!(format_decimal(0.0), "0.0");
        assert_eq!(format_decimal(f64::NAN), NOT_AVAILABLE);
    }

    #[test]
    fn test_cell_format_apply() {
        assert_eq!(CellFormat::Hour.apply(&CellValue::Int(9)), "09:00");
        assert_eq!(CellFormat::Count.apply(&CellValue::Int(12)), "12");
        assert_eq!(CellFormat::Decimal.apply(&CellValue::Float(42.5)), "42.5");
        assert_eq!(CellFormat::Text.apply(&CellValue::Null), NOT_AVAILABLE);
        assert_eq!(CellFormat::Count.apply(&CellValue::text("x")), "x");
    }

    #[test]
    fn test_empty_section_renders_no_data_row() {
        let section = ReportSection::new(
            "Busiest Zones",
            vec![Column::text("Zone"), Column::count("Visits")],
        );
        let rows = section.formatted_rows();
        assert_eq!(rows, vec![vec![NO_DATA.to_string(), String::new()]]);
    }

    #[test]
    fn test_push_row_pads_missing_cells() {
        let mut section = ReportSection::new("t", vec![Column::text("a"), Column::count("b")]);
        section.push_row(vec![CellValue::text("x")]);
        assert_eq!(section.formatted_rows(), vec![vec!["x".to_string(), NOT_AVAILABLE.to_string()]]);
    }

    #[test]
    fn test_chart_spec_max_value() {
        let spec = ChartSpec::new("visits", ChartKind::Bar).with_points(vec![("a", 3.0), ("b", 7.5)]);
        assert_eq!(spec.max_value(), 7.5);
        assert_eq!(ChartSpec::new("empty", ChartKind::Line).max_value(), 0.0);
    }
}
