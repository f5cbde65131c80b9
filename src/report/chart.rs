// ==========================================
// 展会访客分析导出 - 图表渲染
// ==========================================
// 职责: ChartSpec -> 内存 RGB 位图（柱状图/折线图）
// 约束: 只绘制图形不绘制文字（标签由 PDF 渲染器以文本写出），
//       不依赖系统字体；配色固定，相同输入得到相同像素
// ==========================================

use plotters::prelude::*;
use thiserror::Error;

use crate::domain::document::{ChartKind, ChartSpec};

pub const DEFAULT_CHART_WIDTH: u32 = 640;
pub const DEFAULT_CHART_HEIGHT: u32 = 320;

/// 柱状图配色（按柱序号循环）
const PALETTE: [RGBColor; 6] = [
    RGBColor(54, 162, 235),
    RGBColor(255, 159, 64),
    RGBColor(75, 192, 192),
    RGBColor(153, 102, 255),
    RGBColor(255, 99, 132),
    RGBColor(201, 203, 207),
];
const LINE_COLOR: RGBColor = RGBColor(30, 144, 255);
const AXIS_COLOR: RGBColor = RGBColor(96, 96, 96);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("图表尺寸无效: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("图表数据无效: bucket={bucket}")]
    InvalidValue { bucket: String },

    #[error("图表绘制失败: {0}")]
    Backend(String),
}

fn backend_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Backend(err.to_string())
}

/// 渲染结果：行优先的 8-bit RGB 像素
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT)
    }
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 渲染图表
    ///
    /// 0 个点时只画坐标轴；数值必须为有限非负数
    pub fn render(&self, spec: &ChartSpec) -> Result<ChartImage, ChartError> {
        if self.width < 64 || self.height < 64 {
            return Err(ChartError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if let Some(bad) = spec.points.iter().find(|p| !p.value.is_finite() || p.value < 0.0) {
            return Err(ChartError::InvalidValue {
                bucket: bad.bucket.clone(),
            });
        }

        let mut rgb = vec![255u8; (self.width as usize) * (self.height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(backend_err)?;

            let x_max = spec.points.len().max(1) as f64;
            let y_max = (spec.max_value() * 1.1).max(1.0);

            let mut chart = ChartBuilder::on(&root)
                .margin(24)
                .build_cartesian_2d(0f64..x_max, 0f64..y_max)
                .map_err(backend_err)?;

            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(0.0, y_max), (0.0, 0.0), (x_max, 0.0)],
                    AXIS_COLOR.stroke_width(2),
                )))
                .map_err(backend_err)?;

            match spec.kind {
                ChartKind::Bar => {
                    chart
                        .draw_series(spec.points.iter().enumerate().map(|(i, p)| {
                            let x = i as f64;
                            Rectangle::new(
                                [(x + 0.15, 0.0), (x + 0.85, p.value)],
                                PALETTE[i % PALETTE.len()].filled(),
                            )
                        }))
                        .map_err(backend_err)?;
                }
                ChartKind::Line => {
                    let points: Vec<(f64, f64)> = spec
                        .points
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (i as f64 + 0.5, p.value))
                        .collect();
                    chart
                        .draw_series(LineSeries::new(points.clone(), LINE_COLOR.stroke_width(2)))
                        .map_err(backend_err)?;
                    chart
                        .draw_series(points.into_iter().map(|pt| Circle::new(pt, 4, LINE_COLOR.filled())))
                        .map_err(backend_err)?;
                }
            }

            root.present().map_err(backend_err)?;
        }

        tracing::debug!(
            chart = %spec.label,
            points = spec.points.len(),
            width = self.width,
            height = self.height,
            "图表渲染完成"
        );

        Ok(ChartImage {
            width: self.width,
            height: self.height,
            rgb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_spec() -> ChartSpec {
        ChartSpec::new("Visits by Time Slot", ChartKind::Bar)
            .with_points(vec![("10-13", 8.0), ("13-16", 6.0), ("16-19", 4.0)])
    }

    #[test]
    fn test_render_bar_chart_size() {
        let image = ChartRenderer::default().render(&bar_spec()).unwrap();
        assert_eq!(image.width, DEFAULT_CHART_WIDTH);
        assert_eq!(image.rgb.len(), (DEFAULT_CHART_WIDTH * DEFAULT_CHART_HEIGHT * 3) as usize);
        // 至少画出了非白色像素
        assert!(image.rgb.iter().any(|b| *b != 255));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = ChartRenderer::default();
        let spec = ChartSpec::new("Hourly Entries", ChartKind::Line)
            .with_points(vec![("10:00", 5.0), ("14:00", 7.0)]);
        assert_eq!(renderer.render(&spec).unwrap(), renderer.render(&spec).unwrap());
    }

    #[test]
    fn test_render_empty_and_single_point() {
        let renderer = ChartRenderer::new(200, 100);
        assert!(renderer.render(&ChartSpec::new("Empty", ChartKind::Line)).is_ok());
        let single = ChartSpec::new("One", ChartKind::Bar).with_points(vec![("A", 3.0)]);
        assert!(renderer.render(&single).is_ok());
    }

    #[test]
    fn test_render_rejects_non_finite_value() {
        let spec = ChartSpec::new("Bad", ChartKind::Bar).with_points(vec![("A", f64::NAN)]);
        assert!(matches!(
            ChartRenderer::default().render(&spec),
            Err(ChartError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_render_rejects_tiny_canvas() {
        let renderer = ChartRenderer::new(10, 10);
        assert!(matches!(
            renderer.render(&bar_spec()),
            Err(ChartError::InvalidSize { .. })
        ));
    }
}
