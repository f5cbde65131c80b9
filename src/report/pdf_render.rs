// ==========================================
// 展会访客分析导出 - PDF 渲染
// ==========================================
// 版面: A4 纵向；封面 + 每个主要分节一页；图表在表格上方；
//       表格带边框与表头，超出页面时续页并重复表头
// 字体: 内置 Helvetica / Helvetica-Bold（非 ASCII 字符以 '?' 输出）
// 约束: 图表渲染失败时只保留表格并附说明，不影响整份报表
// ==========================================

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::io::Write;

use crate::domain::document::{ChartSpec, PdfDocument, ReportSection, TitlePage};
use crate::report::chart::{ChartImage, ChartRenderer};
use crate::report::error::{ReportError, ReportResult};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const ROW_HEIGHT: f32 = 16.0;
const TABLE_FONT_SIZE: f32 = 9.0;
const CELL_PADDING: f32 = 4.0;
/// Helvetica 平均字宽（em）
const CHAR_WIDTH_EM: f32 = 0.52;
/// 图表位图四周的留白（像素，与 ChartRenderer 的 margin 一致）
const CHART_MARGIN_PX: f32 = 24.0;

/// 图表降级时写在页面上的说明
pub const CHART_UNAVAILABLE_NOTE: &str = "Chart unavailable; table shown without chart.";

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn name(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
        }
    }
}

/// PDF 文本：仅保留可打印 ASCII
fn pdf_text(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\n' | '\r' | '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

fn text_width(s: &str, size: f32) -> f32 {
    s.chars().count() as f32 * size * CHAR_WIDTH_EM
}

/// 按宽度截断，超出部分以 ".." 结尾
fn fit_text(s: &str, max_width: f32, size: f32) -> String {
    let max_chars = (max_width / (size * CHAR_WIDTH_EM)).floor().max(0.0) as usize;
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 2 {
        return s.chars().take(max_chars).collect();
    }
    let mut out: String = s.chars().take(max_chars - 2).collect();
    out.push_str("..");
    out
}

fn draw_text(content: &mut Content, font: Font, size: f32, x: f32, y: f32, s: &str) {
    let bytes = pdf_text(s);
    content.begin_text();
    content.set_font(font.name(), size);
    content.next_line(x, y);
    content.show(Str(&bytes));
    content.end_text();
}

struct LaidOutPage {
    content: Content,
    chart: Option<ChartImage>,
}

impl LaidOutPage {
    fn new() -> Self {
        let mut content = Content::new();
        content.set_line_width(0.5);
        content.set_stroke_rgb(0.55, 0.55, 0.55);
        Self {
            content,
            chart: None,
        }
    }
}

/// 逐页排版的游标
struct Layout {
    done: Vec<LaidOutPage>,
    current: LaidOutPage,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: LaidOutPage::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn next_page(&mut self, heading: &str) {
        let prev = std::mem::replace(&mut self.current, LaidOutPage::new());
        self.done.push(prev);

        let baseline = PAGE_HEIGHT - MARGIN - 16.0;
        draw_text(&mut self.current.content, Font::Bold, 16.0, MARGIN, baseline, heading);
        self.current
            .content
            .move_to(MARGIN, baseline - 8.0)
            .line_to(PAGE_WIDTH - MARGIN, baseline - 8.0)
            .stroke();
        self.y = baseline - 28.0;
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN
    }

    fn finish(mut self, footer: &str) -> Vec<LaidOutPage> {
        self.done.push(self.current);
        let total = self.done.len();
        for (idx, page) in self.done.iter_mut().enumerate() {
            let label = format!("{} - Page {} of {}", footer, idx + 1, total);
            let x = PAGE_WIDTH - MARGIN - text_width(&label, 8.0);
            draw_text(&mut page.content, Font::Regular, 8.0, x, MARGIN / 2.0, &label);
        }
        self.done
    }
}

fn draw_title_page(layout: &mut Layout, title_page: &TitlePage) {
    let content = &mut layout.current.content;
    let mut y = PAGE_HEIGHT - 200.0;
    draw_text(content, Font::Bold, 24.0, MARGIN, y, &title_page.title);
    y -= 28.0;
    draw_text(content, Font::Regular, 14.0, MARGIN, y, &title_page.subtitle);
    y -= 16.0;
    content
        .move_to(MARGIN, y)
        .line_to(PAGE_WIDTH - MARGIN, y)
        .stroke();
    y -= 30.0;

    for (label, value) in &title_page.facts {
        draw_text(content, Font::Bold, 11.0, MARGIN, y, label);
        let value = fit_text(value, CONTENT_WIDTH - 200.0, 11.0);
        draw_text(content, Font::Regular, 11.0, MARGIN + 200.0, y, &value);
        y -= 20.0;
    }
    layout.y = y;
}

/// 把图表放到当前页；失败时返回 false（调用方写降级说明）
fn place_chart(layout: &mut Layout, spec: &ChartSpec, charts: &ChartRenderer) -> bool {
    let image = match charts.render(spec) {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(chart = %spec.label, error = %e, "图表渲染失败，降级为仅表格");
            return false;
        }
    };

    let scale = CONTENT_WIDTH / image.width as f32;
    let height = image.height as f32 * scale;
    let label_y = layout.y - 12.0;
    let image_top = label_y - 6.0;
    let image_bottom = image_top - height;

    let content = &mut layout.current.content;
    draw_text(content, Font::Bold, 10.0, MARGIN, label_y, &spec.label);
    content.save_state();
    content.transform([CONTENT_WIDTH, 0.0, 0.0, height, MARGIN, image_bottom]);
    content.x_object(Name(b"Im1"));
    content.restore_state();

    // 刻度标签: 桶名写在 x 轴下方，最大值写在 y 轴顶端
    let plot_left = MARGIN + CHART_MARGIN_PX * scale;
    let plot_width = (image.width as f32 - 2.0 * CHART_MARGIN_PX) * scale;
    let n = spec.points.len().max(1) as f32;
    let slot_width = plot_width / n;
    for (i, point) in spec.points.iter().enumerate() {
        let label = fit_text(&point.bucket, slot_width - 2.0, 7.0);
        let center = plot_left + slot_width * (i as f32 + 0.5);
        let x = center - text_width(&label, 7.0) / 2.0;
        draw_text(content, Font::Regular, 7.0, x, image_bottom + 4.0, &label);
    }
    let max_label = format!("max {}", crate::domain::document::format_decimal(spec.max_value()));
    draw_text(
        content,
        Font::Regular,
        7.0,
        plot_left + 4.0,
        image_top - CHART_MARGIN_PX * scale + 2.0,
        &max_label,
    );

    layout.current.chart = Some(image);
    layout.y = image_bottom - 14.0;
    true
}

fn draw_row(layout: &mut Layout, section: &ReportSection, cells: &[String], header: bool) {
    let columns = section.columns.len().max(1);
    let col_width = CONTENT_WIDTH / columns as f32;
    let top = layout.y;
    let bottom = top - ROW_HEIGHT;
    let content = &mut layout.current.content;

    for (i, cell) in cells.iter().enumerate().take(columns) {
        let x = MARGIN + col_width * i as f32;
        if header {
            content.set_fill_rgb(0.88, 0.88, 0.88);
            content.rect(x, bottom, col_width, ROW_HEIGHT);
            content.fill_nonzero_and_stroke();
            content.set_fill_rgb(0.0, 0.0, 0.0);
        } else {
            content.rect(x, bottom, col_width, ROW_HEIGHT);
            content.stroke();
        }

        let font = if header { Font::Bold } else { Font::Regular };
        let text = fit_text(cell, col_width - 2.0 * CELL_PADDING, TABLE_FONT_SIZE);
        let numeric = !header
            && section
                .columns
                .get(i)
                .map(|c| c.format.is_numeric())
                .unwrap_or(false);
        let text_x = if numeric {
            x + col_width - CELL_PADDING - text_width(&text, TABLE_FONT_SIZE)
        } else {
            x + CELL_PADDING
        };
        draw_text(content, font, TABLE_FONT_SIZE, text_x, bottom + 5.0, &text);
    }
    layout.y = bottom;
}

fn draw_section(layout: &mut Layout, heading: &str, section: &ReportSection) {
    // 标题 + 表头 + 至少一行
    if layout.remaining() < ROW_HEIGHT * 2.0 + 24.0 {
        layout.next_page(&format!("{} (cont.)", heading));
    }

    layout.y -= 12.0;
    draw_text(&mut layout.current.content, Font::Bold, 12.0, MARGIN, layout.y, &section.title);
    layout.y -= 8.0;

    if let Some(note) = &section.note {
        layout.y -= 10.0;
        draw_text(&mut layout.current.content, Font::Regular, 9.0, MARGIN, layout.y, note);
        layout.y -= 6.0;
    }

    let header = section.header();
    draw_row(layout, section, &header, true);
    for row in section.formatted_rows() {
        if layout.remaining() < ROW_HEIGHT {
            layout.next_page(&format!("{} (cont.)", heading));
            draw_row(layout, section, &header, true);
        }
        draw_row(layout, section, &row, false);
    }
    layout.y -= 14.0;
}

fn layout_document(doc: &PdfDocument, charts: &ChartRenderer) -> Vec<LaidOutPage> {
    let mut layout = Layout::new();
    draw_title_page(&mut layout, &doc.title_page);

    for page in &doc.pages {
        layout.next_page(&page.heading);

        if let Some(spec) = &page.chart {
            if !place_chart(&mut layout, spec, charts) {
                layout.y -= 12.0;
                draw_text(
                    &mut layout.current.content,
                    Font::Regular,
                    9.0,
                    MARGIN,
                    layout.y,
                    CHART_UNAVAILABLE_NOTE,
                );
                layout.y -= 6.0;
            }
        }

        for section in &page.sections {
            draw_section(&mut layout, &page.heading, section);
        }
    }

    layout.finish(&doc.title_page.title)
}

struct RefAllocator(i32);

impl RefAllocator {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// PdfDocument -> PDF 字节
pub fn render_pdf(doc: &PdfDocument, charts: &ChartRenderer) -> ReportResult<Vec<u8>> {
    let pages = layout_document(doc, charts);

    let mut ids = RefAllocator(0);
    let catalog_id = ids.next();
    let tree_id = ids.next();
    let font_regular_id = ids.next();
    let font_bold_id = ids.next();
    let info_id = ids.next();

    struct PageIds {
        page: Ref,
        content: Ref,
        image: Option<Ref>,
    }
    let page_ids: Vec<PageIds> = pages
        .iter()
        .map(|p| PageIds {
            page: ids.next(),
            content: ids.next(),
            image: p.chart.as_ref().map(|_| ids.next()),
        })
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().map(|p| p.page))
        .count(page_ids.len() as i32);
    pdf.type1_font(font_regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(font_bold_id).base_font(Name(b"Helvetica-Bold"));

    for (laid_out, refs) in pages.into_iter().zip(page_ids.iter()) {
        {
            let mut page = pdf.page(refs.page);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(tree_id);
            page.contents(refs.content);
            let mut resources = page.resources();
            resources
                .fonts()
                .pair(Font::Regular.name(), font_regular_id)
                .pair(Font::Bold.name(), font_bold_id);
            if let Some(image_id) = refs.image {
                resources.x_objects().pair(Name(b"Im1"), image_id);
            }
            resources.finish();
            page.finish();
        }

        pdf.stream(refs.content, &laid_out.content.finish());

        if let (Some(image_id), Some(image)) = (refs.image, laid_out.chart) {
            let data = compress(&image.rgb)
                .map_err(|e| ReportError::RenderFailure(format!("图表压缩失败: {}", e)))?;
            let mut xobject = pdf.image_xobject(image_id, &data);
            xobject.filter(Filter::FlateDecode);
            xobject.width(image.width as i32);
            xobject.height(image.height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            xobject.finish();
        }
    }

    let title = String::from_utf8_lossy(&pdf_text(&doc.title_page.title)).into_owned();
    pdf.document_info(info_id)
        .title(TextStr(&title))
        .producer(TextStr("exhibition-export"));

    let bytes = pdf.finish();
    tracing::debug!(pages = page_ids.len(), bytes = bytes.len(), "PDF 编码完成");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{CellValue, ChartKind, Column, PdfPage};

    fn sample_doc(rows: usize) -> PdfDocument {
        let section = ReportSection::new("Visits by Zone", vec![Column::text("Zone"), Column::count("Visits")])
            .with_rows((0..rows).map(|i| vec![CellValue::text(format!("Z{}", i)), CellValue::Int(i as i64)]));
        let chart = ChartSpec::new("Visits by Zone", ChartKind::Bar).with_points(vec![("B", 10.0), ("C", 5.0)]);
        PdfDocument {
            title_page: TitlePage {
                title: "Attendance & Usage Report".to_string(),
                subtitle: "Day 1 (2025-10-28)".to_string(),
                facts: vec![("Report Date".to_string(), "2025-10-28".to_string())],
            },
            pages: vec![PdfPage::charted(section, chart)],
        }
    }

    fn page_count(bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        text.matches("/Type /Page\n").count() + text.matches("/Type /Page ").count()
    }

    #[test]
    fn test_render_pdf_header_and_size() {
        let bytes = render_pdf(&sample_doc(3), &ChartRenderer::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 100);
    }

    #[test]
    fn test_long_table_continues_on_extra_pages() {
        let short = render_pdf(&sample_doc(3), &ChartRenderer::default()).unwrap();
        let long = render_pdf(&sample_doc(120), &ChartRenderer::default()).unwrap();
        assert!(String::from_utf8_lossy(&long).contains("cont."));
        assert!(page_count(&long) > page_count(&short) || long.len() > short.len());
    }

    #[test]
    fn test_chart_failure_degrades_to_note() {
        let bytes = render_pdf(&sample_doc(3), &ChartRenderer::new(8, 8)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(CHART_UNAVAILABLE_NOTE));
        assert!(!text.contains("/Im1"));
    }

    #[test]
    fn test_fit_and_sanitize_text() {
        assert_eq!(fit_text("short", 100.0, 9.0), "short");
        assert!(fit_text("a very long building name indeed", 40.0, 9.0).ends_with(".."));
        assert_eq!(pdf_text("Café"), b"Caf?".to_vec());
    }
}
