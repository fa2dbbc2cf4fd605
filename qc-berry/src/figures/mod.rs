//! 报告附图.
//!
//! 除分割轮廓图经由 [`Renderer`](crate::render::Renderer) 绘制外, 其余附图都是简单的二维统计图,
//! 用 plotters 的 SVG 后端直接写出. 画布尺寸以英寸给出, 按 dpi 换算为像素.

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::VizResult;
use crate::render::Document;

mod background;
mod dist;
mod fd;
mod segmentation;
pub mod stats;

pub use background::{plot_bg_dist, plot_bg_fit, BackgroundFit, BACKGROUND_PLACEHOLDER};
pub use dist::{plot_dist, plot_dist_values, values_inside_mask};
pub use fd::{plot_fd, plot_fd_series};
pub use segmentation::{axial_cut_positions, plot_segmentation, SegmentationOptions};

use stats::{freedman_diaconis_bins, Histogram, Kde, Sample};

/// SVG 绘图区.
pub(crate) type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// 主色.
pub(crate) const MPL_BLUE: RGBColor = RGBColor(0x1f, 0x77, 0xb4);

/// 基准字号 (点).
const FONT_PT: f64 = 9.0;

/// 英寸尺寸在 `dpi` 下的像素尺寸.
pub(crate) fn pixel_size((w, h): (f64, f64), dpi: u32) -> (u32, u32) {
    let d = f64::from(dpi);
    ((w * d).round() as u32, (h * d).round() as u32)
}

/// 点数在 `dpi` 下的像素数.
#[inline]
pub(crate) fn points_to_px(points: f64, dpi: u32) -> f64 {
    points * f64::from(dpi) / 72.0
}

/// 线宽 (点) 在 `dpi` 下的像素数, 至少为 1.
#[inline]
pub(crate) fn stroke_px(points: f64, dpi: u32) -> u32 {
    (points_to_px(points, dpi).round() as u32).max(1)
}

/// 基准字号的 `scale` 倍.
pub(crate) fn font(dpi: u32, scale: f64) -> FontDesc<'static> {
    ("sans-serif", points_to_px(FONT_PT * scale, dpi)).into_font()
}

/// 在 `figsize` 英寸的白底画布上调用 `draw`, 返回 SVG 文档.
pub(crate) fn draw_svg<F>(figsize: (f64, f64), dpi: u32, draw: F) -> VizResult<Document>
where
    F: FnOnce(&Area<'_>) -> VizResult<()>,
{
    let (w, h) = pixel_size(figsize, dpi);
    let mut content = String::with_capacity(64 * 1024);
    {
        let root = SVGBackend::with_string(&mut content, (w, h)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(Document::svg(f64::from(w), f64::from(h), content))
}

/// 数据范围两端各留 5% 的余量. 退化范围扩展为单位宽度.
pub(crate) fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    let m = (hi - lo) * 0.05;
    (lo - m, hi + m)
}

/// 标签数值: 最多 6 位有效数字, 去掉多余的零.
pub(crate) fn fmt_g(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-4..1e6).contains(&a) {
        return format!("{v:e}");
    }
    let digits = if a == 0.0 { 0 } else { a.log10().floor() as i32 };
    let decimals = (5 - digits).max(0) as usize;
    let s = format!("{v:.decimals$}");
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        &s
    };
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// 参考线.
pub(crate) struct Marker<'a> {
    /// 所在数值.
    pub value: f64,

    /// 沿线旋转 90 度书写的标签.
    pub label: &'a str,
}

/// 分布图: 按密度归一化的直方图, 叠加核密度曲线.
///
/// `vertical` 为真时数值沿纵轴分布, 此时 `value_lim` 给定纵轴范围.
/// `marker` 只在数值沿横轴分布时绘制.
pub(crate) fn distplot(
    area: &Area<'_>,
    dpi: u32,
    sample: &Sample,
    vertical: bool,
    value_lim: Option<(f64, f64)>,
    value_desc: Option<&str>,
    marker: Option<Marker<'_>>,
) -> VizResult<()> {
    let hist = Histogram::new(sample, freedman_diaconis_bins(sample));
    let kde = Kde::new(sample).map(|k| k.curve());
    let density = hist.as_ref().map(Histogram::density).unwrap_or_default();

    let peak = density
        .iter()
        .copied()
        .chain(kde.iter().flatten().map(|&(_, y)| y))
        .fold(0.0, f64::max);
    let dens_lim = (0.0, if peak > 0.0 { peak * 1.05 } else { 1.0 });

    let value_lim = value_lim.unwrap_or_else(|| {
        let lo = kde.as_ref().and_then(|c| c.first()).map(|p| p.0).or(sample.min());
        let hi = kde.as_ref().and_then(|c| c.last()).map(|p| p.0).or(sample.max());
        padded((lo.unwrap_or(0.0), hi.unwrap_or(1.0)))
    });

    // (数值, 密度) -> 图上坐标.
    let at = |v: f64, d: f64| if vertical { (d, v) } else { (v, d) };
    let (x0, y0) = at(value_lim.0, dens_lim.0);
    let (x1, y1) = at(value_lim.1, dens_lim.1);

    let fs = points_to_px(FONT_PT, dpi);
    let mut chart = ChartBuilder::on(area)
        .margin(fs as u32)
        .x_label_area_size((fs * 3.0) as u32)
        .y_label_area_size((fs * 5.0) as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .label_style(font(dpi, 0.8))
        .axis_desc_style(font(dpi, 1.0));
    if let Some(desc) = value_desc {
        if vertical {
            mesh.y_desc(desc);
        } else {
            mesh.x_desc(desc);
        }
    }
    mesh.draw()?;

    if let Some(h) = &hist {
        chart.draw_series(
            density
                .iter()
                .zip(h.edges().windows(2))
                .map(|(&d, e)| Rectangle::new([at(e[0], 0.0), at(e[1], d)], MPL_BLUE.mix(0.4).filled())),
        )?;
    }
    if let Some(curve) = kde {
        chart.draw_series(LineSeries::new(
            curve.into_iter().map(|(v, d)| at(v, d)),
            MPL_BLUE.stroke_width(stroke_px(1.5, dpi)),
        ))?;
    }

    match marker {
        Some(m) if !vertical && m.value.is_finite() => {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(m.value, dens_lim.0), (m.value, dens_lim.1)],
                MPL_BLUE.stroke_width(stroke_px(1.5, dpi)),
            )))?;
            let pad = (value_lim.1 - value_lim.0) / 100.0;
            let style = font(dpi, 1.0)
                .transform(FontTransform::Rotate270)
                .color(&MPL_BLUE);
            chart.draw_series(std::iter::once(Text::new(
                m.label.to_string(),
                (m.value - pad, (dens_lim.0 + dens_lim.1) / 2.0),
                style,
            )))?;
        }
        _ => {}
    }
    Ok(())
}
