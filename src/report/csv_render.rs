// ==========================================
// 展会访客分析导出 - CSV 渲染
// ==========================================
// 格式: 每节 = 标题行 + 表头行（全部加引号）+ 数据行（最小引用）
//       节与节之间空一行
// ==========================================

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::document::CsvDocument;
use crate::report::error::{ReportError, ReportResult};

fn write_records(out: &mut Vec<u8>, style: QuoteStyle, records: &[Vec<String>]) -> csv::Result<()> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(style)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// CsvDocument -> CSV 文本
pub fn render_csv(doc: &CsvDocument) -> ReportResult<String> {
    let mut out: Vec<u8> = Vec::new();
    let encode_err = |e: csv::Error| ReportError::RenderFailure(format!("CSV 编码失败: {}", e));

    for (idx, section) in doc.sections.iter().enumerate() {
        if idx > 0 {
            out.push(b'\n');
        }
        write_records(&mut out, QuoteStyle::Necessary, &[vec![section.title.clone()]]).map_err(encode_err)?;
        write_records(&mut out, QuoteStyle::Always, &[section.header()]).map_err(encode_err)?;
        write_records(&mut out, QuoteStyle::Necessary, &section.formatted_rows()).map_err(encode_err)?;
    }

    String::from_utf8(out).map_err(|e| ReportError::RenderFailure(format!("CSV 非 UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{CellValue, Column, ReportSection};

    #[test]
    fn test_render_sections_with_blank_line() {
        let doc = CsvDocument {
            sections: vec![
                ReportSection::new("First", vec![Column::text("Name"), Column::count("Count")])
                    .with_rows(vec![vec![CellValue::text("A"), CellValue::Int(1)]]),
                ReportSection::new("Second", vec![Column::text("Zone")]),
            ],
        };

        let text = render_csv(&doc).unwrap();
        assert_eq!(
            text,
            "First\n\"Name\",\"Count\"\nA,1\n\nSecond\n\"Zone\"\nNo data\n"
        );
    }

    #[test]
    fn test_render_minimal_quoting() {
        let doc = CsvDocument {
            sections: vec![ReportSection::new("Quotes", vec![Column::text("Value")]).with_rows(vec![
                vec![CellValue::text("Hall A, East")],
                vec![CellValue::text("say \"hi\"")],
                vec![CellValue::text("line\nbreak")],
            ])],
        };

        let text = render_csv(&doc).unwrap();
        assert!(text.contains("\"Hall A, East\"\n"));
        assert!(text.contains("\"say \"\"hi\"\"\"\n"));
        assert!(text.contains("\"line\nbreak\"\n"));
    }
}
