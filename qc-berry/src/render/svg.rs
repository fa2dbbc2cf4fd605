//! 手写的 SVG 后端.
//!
//! 像素图按行做游程合并后输出为 `<rect>`, 文字直接使用 `<text>`.
//! 所有数值以固定精度格式化, 相同输入总是得到逐字节相同的输出.

use std::fmt::Write;

use ndarray::s;

use super::{CutRowRequest, DisplayMode, Document, Fragment, Layout, Renderer, RendererConfig};
use crate::consts::rgb::{BLACK, CONTOUR_RED, WHITE};
use crate::error::{VizError, VizResult};
use crate::PanelImage;

/// 相邻切片之间的间隔 (输出单位).
const GAP: f64 = 2.0;

/// 毫米与英寸的换算.
const MM_PER_INCH: f64 = 25.4;

/// 转义 XML 特殊字符.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[inline]
pub(crate) fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// 包装成完整的 SVG 文档. `units_per_inch` 用于把内部单位换算为 `dpi` 下的像素尺寸.
fn wrap_document(
    width: f64,
    height: f64,
    units_per_inch: f64,
    dpi: u32,
    body: &str,
) -> Document {
    let scale = f64::from(dpi) / units_per_inch;
    let content = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {width:.3} {height:.3}">{body}</svg>"##,
        width * scale,
        height * scale,
    );
    Document::svg(width, height, content)
}

/// 把 `(行, 列) -> 颜色` 的像素网格写成按行游程合并的矩形.
///
/// 第 0 行位于 `y0` 处 (画面最上方).
fn write_pixels<F>(out: &mut String, (h, w): (usize, usize), origin: (f64, f64), cell: (f64, f64), color: F)
where
    F: Fn(usize, usize) -> [u8; 3],
{
    let (x0, y0) = origin;
    let (cw, ch) = cell;
    for r in 0..h {
        let mut c = 0;
        while c < w {
            let rgb = color(r, c);
            let mut end = c + 1;
            while end < w && color(r, end) == rgb {
                end += 1;
            }
            let _ = write!(
                out,
                r##"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"##,
                x0 + c as f64 * cw,
                y0 + r as f64 * ch,
                (end - c) as f64 * cw,
                ch,
                hex(rgb)
            );
            c = end;
        }
    }
}

/// 白字黑底的文字标签. `(x, y)` 为文字基线中点.
fn write_label(out: &mut String, text: &str, (x, y): (f64, f64), size: f64, anchor: &str) {
    let approx_w = size * 0.6 * text.chars().count() as f64;
    let left = match anchor {
        "middle" => x - approx_w / 2.0,
        "end" => x - approx_w,
        _ => x,
    };
    let _ = write!(
        out,
        r##"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/><text x="{x:.3}" y="{y:.3}" fill="{}" font-family="sans-serif" font-size="{size:.1}" text-anchor="{anchor}">{}</text>"##,
        left,
        y - size,
        approx_w,
        size * 1.25,
        hex(BLACK),
        hex(WHITE),
        escape(text)
    );
}

/// 生成 SVG 的渲染后端.
#[derive(Clone, Debug, Default)]
pub struct SvgRenderer {
    config: RendererConfig,
}

impl SvgRenderer {
    /// 以 `config` 创建后端.
    #[inline]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// 在 `(x0, y0)` 处渲染第 `index` 刀切片, 返回其尺寸.
    ///
    /// 切片按 `(水平, 竖直)` 组织: 水平切片为 `(x, y)`, 矢状切片为 `(y, z)`.
    fn render_cut(
        &self,
        request: &CutRowRequest<'_>,
        index: usize,
        (x0, y0): (f64, f64),
        out: &mut String,
    ) -> (f64, f64) {
        let cut = request.cuts[index];
        let [sx, sy, sz] = request.spacing;
        let (plane, overlay, (sh, sv)) = match request.mode {
            DisplayMode::Axial => (
                request.volume.slice(s![.., .., cut]),
                request.overlay.map(|m| m.slice_move(s![.., .., cut])),
                (sx, sy),
            ),
            DisplayMode::Sagittal => (
                request.volume.slice(s![cut, .., ..]),
                request.overlay.map(|m| m.slice_move(s![cut, .., ..])),
                (sy, sz),
            ),
        };
        let (nh, nv) = plane.dim();
        let u = self.config.units_per_mm;
        let cell = (sh * u, sv * u);

        // 水平方向为数组第 0 维, 竖直方向为第 1 维且向上增长.
        write_pixels(out, (nv, nh), (x0, y0), cell, |r, c| {
            let v = plane[(c, nv - 1 - r)];
            request
                .colormap
                .lookup(request.bounds.normalize(f64::from(v)))
        });

        if let Some(mask) = overlay {
            let on_edge = |i: usize, j: usize| -> bool {
                if !mask[(i, j)] {
                    return false;
                }
                let neighbours = [
                    (i.wrapping_sub(1), j),
                    (i + 1, j),
                    (i, j.wrapping_sub(1)),
                    (i, j + 1),
                ];
                neighbours
                    .into_iter()
                    .any(|p| mask.get(p).map_or(true, |&m| !m))
            };
            for i in 0..nh {
                for j in 0..nv {
                    if on_edge(i, j) {
                        let _ = write!(
                            out,
                            r##"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"##,
                            x0 + i as f64 * cell.0,
                            y0 + (nv - 1 - j) as f64 * cell.1,
                            cell.0,
                            cell.1,
                            hex(CONTOUR_RED)
                        );
                    }
                }
            }
        }

        let width = nh as f64 * cell.0;
        let height = nv as f64 * cell.1;
        let fs = self.config.font_size;
        write_label(
            out,
            &format!("{}={:.0}", request.mode.axis_name(), request.coords[index]),
            (x0 + 2.0, y0 + fs),
            fs * 0.8,
            "start",
        );
        (width, height)
    }
}

impl Renderer for SvgRenderer {
    fn render_panel(&mut self, panel: &PanelImage) -> VizResult<Fragment> {
        let (h, w) = panel.shape();
        let (ew, eh) = panel.extent();
        let u = self.config.units_per_mm;
        let (width, height) = (ew * u, eh * u);
        let cell = (width / w.max(1) as f64, height / h.max(1) as f64);

        let pixels = panel.pixels();
        let mut body = String::with_capacity(h * w * 16);
        write_pixels(&mut body, (h, w), (0.0, 0.0), cell, |r, c| {
            [pixels[(r, c, 0)], pixels[(r, c, 1)], pixels[(r, c, 2)]]
        });
        if let Some(label) = panel.label() {
            let fs = self.config.font_size;
            write_label(&mut body, label, (width / 2.0, height - fs * 0.25), fs, "middle");
        }
        Ok(Fragment {
            width,
            height,
            body,
        })
    }

    fn render_cut_row(&mut self, request: &CutRowRequest<'_>) -> VizResult<Fragment> {
        if request.cuts.len() != request.coords.len() {
            return Err(VizError::invalid(format!(
                "{} cuts but {} coordinates",
                request.cuts.len(),
                request.coords.len()
            )));
        }
        let fs = self.config.font_size;
        let top = if request.title.is_some() { fs * 1.5 } else { 0.0 };

        let mut cuts = String::new();
        let (mut x, mut height) = (0.0f64, 0.0f64);
        for i in 0..request.cuts.len() {
            let (w, h) = self.render_cut(request, i, (x, top), &mut cuts);
            x += w + GAP;
            height = height.max(h);
        }
        let width = (x - GAP).max(0.0);
        let total_h = height + top;

        let mut body = String::with_capacity(cuts.len() + 256);
        let _ = write!(
            body,
            r##"<rect x="0" y="0" width="{width:.3}" height="{total_h:.3}" fill="{}"/>"##,
            hex(BLACK)
        );
        body.push_str(&cuts);
        if let Some(title) = request.title {
            write_label(&mut body, title, (2.0, fs * 1.1), fs, "start");
        }
        Ok(Fragment {
            width,
            height: total_h,
            body,
        })
    }

    fn compose_document(&mut self, fragments: Vec<Fragment>, layout: Layout) -> VizResult<Document> {
        let units_per_inch = self.config.units_per_mm * MM_PER_INCH;
        let mut body = String::new();

        let (width, height) = match layout {
            Layout::Rows => {
                let mut y = 0.0f64;
                let mut width = 0.0f64;
                for f in fragments.iter() {
                    let _ = write!(body, r##"<g transform="translate(0,{y:.3})">{}</g>"##, f.body);
                    y += f.height;
                    width = width.max(f.width);
                }
                (width, y)
            }
            Layout::Grid {
                rows,
                columns,
                per_cell,
            } => {
                let per_cell = per_cell.max(1);
                let cells = fragments.len().div_ceil(per_cell);
                if cells > rows * columns {
                    return Err(VizError::invalid(format!(
                        "{cells} cells do not fit a {rows}x{columns} grid"
                    )));
                }
                let cell_w = fragments.iter().map(|f| f.width).fold(0.0, f64::max);
                let cell_h = fragments
                    .chunks(per_cell)
                    .map(|c| c.iter().map(|f| f.height).sum::<f64>())
                    .fold(0.0, f64::max);
                for (i, cell) in fragments.chunks(per_cell).enumerate() {
                    let cx = (i % columns) as f64 * (cell_w + GAP);
                    let mut cy = (i / columns) as f64 * (cell_h + GAP);
                    for f in cell {
                        let _ = write!(
                            body,
                            r##"<g transform="translate({cx:.3},{cy:.3})">{}</g>"##,
                            f.body
                        );
                        cy += f.height;
                    }
                }
                let w = columns as f64 * (cell_w + GAP) - GAP;
                let h = rows as f64 * (cell_h + GAP) - GAP;
                (w.max(0.0), h.max(0.0))
            }
        };

        Ok(wrap_document(width, height, units_per_inch, self.config.dpi, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IntensityBounds;
    use crate::render::Colormap;
    use ndarray::Array3;

    fn request<'a>(volume: &'a Array3<f32>, mask: Option<&'a Array3<bool>>) -> CutRowRequest<'a> {
        CutRowRequest {
            volume: volume.view(),
            spacing: [1.0, 1.0, 2.0],
            mode: DisplayMode::Axial,
            cuts: vec![0, 2],
            coords: vec![0.0, 4.0],
            bounds: IntensityBounds::new(0.0, 1.0).unwrap(),
            colormap: Colormap::GreysR,
            overlay: mask.map(|m| m.view()),
            title: Some("a <title>"),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_run_length_rects() {
        let mut out = String::new();
        write_pixels(&mut out, (1, 4), (0.0, 0.0), (1.0, 1.0), |_, c| {
            if c < 3 {
                BLACK
            } else {
                WHITE
            }
        });
        assert_eq!(out.matches("<rect").count(), 2);
        assert!(out.contains(r#"width="3.000""#));
    }

    #[test]
    fn test_cut_row_is_deterministic() {
        let volume = Array3::from_shape_fn((4, 3, 3), |(x, y, z)| (x + y + z) as f32 / 8.0);
        let mut r = SvgRenderer::default();
        let a = r.render_cut_row(&request(&volume, None)).unwrap();
        let b = r.render_cut_row(&request(&volume, None)).unwrap();
        assert_eq!(a, b);
        assert!(a.body.contains("z=4"));
        assert!(a.body.contains("a &lt;title&gt;"));
        // 两刀切片, 每刀 4 x 3 个体素, 单位换算 2.
        assert_eq!(a.width, 2.0 * 8.0 + GAP);
    }

    #[test]
    fn test_overlay_draws_contour() {
        let volume = Array3::<f32>::zeros((5, 5, 3));
        let mut mask = Array3::from_elem((5, 5, 3), false);
        mask.slice_mut(s![1..4, 1..4, ..]).fill(true);
        let mut r = SvgRenderer::default();
        let plain = r.render_cut_row(&request(&volume, None)).unwrap();
        let over = r.render_cut_row(&request(&volume, Some(&mask))).unwrap();
        let red = hex(CONTOUR_RED);
        assert!(!plain.body.contains(&red));
        // 3x3 区域的边缘共 8 个体素, 两刀切片.
        assert_eq!(over.body.matches(&red).count(), 16);
    }

    #[test]
    fn test_grid_rejects_overflow() {
        let f = Fragment {
            width: 1.0,
            height: 1.0,
            body: String::new(),
        };
        let mut r = SvgRenderer::default();
        let layout = Layout::Grid {
            rows: 1,
            columns: 1,
            per_cell: 2,
        };
        assert!(r.compose_document(vec![f.clone(), f.clone()], layout).is_ok());
        assert!(r.compose_document(vec![f.clone(), f.clone(), f], layout).is_err());
    }
}
