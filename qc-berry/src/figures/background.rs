//! 背景噪声拟合图.

use std::path::Path;

use plotters::prelude::*;
use serde::Deserialize;

use super::{draw_svg, font, padded, points_to_px, stroke_px, MPL_BLUE};
use crate::consts::DEFAULT_DPI;
use crate::error::{VizError, VizResult};
use crate::render::Document;

/// 无法绘制时输出的说明文字.
pub const BACKGROUND_PLACEHOLDER: &str = "Background noise fitting could not be plotted.";

/// 默认画布尺寸 (英寸).
const FIGSIZE: (f64, f64) = (6.4, 4.8);

/// 背景 (空气) 区域强度分布, 及其拟合结果.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BackgroundFit {
    /// 等距的箱中心.
    pub x: Vec<f64>,

    /// 观测频率.
    pub y: Vec<f64>,

    /// 拟合频率.
    pub y_hat: Vec<f64>,

    /// 截断位置.
    pub x_cutoff: f64,
}

impl BackgroundFit {
    /// 从 JSON 文本解析. 格式错误时返回 `MalformedInput`.
    pub fn from_json(text: &str) -> VizResult<Self> {
        let fit: Self = serde_json::from_str(text).map_err(|e| VizError::MalformedInput {
            line: Some(e.line()),
            reason: e.to_string(),
        })?;
        fit.validate()?;
        Ok(fit)
    }

    /// 纵轴范围 `[0, 1.1 * max(y, y_hat)]`. 最大值不为正时取 `[0, 1]`.
    pub fn ylim(&self) -> (f64, f64) {
        let ymax = self
            .y
            .iter()
            .chain(self.y_hat.iter())
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (0.0, if ymax > 0.0 { 1.1 * ymax } else { 1.0 })
    }

    fn validate(&self) -> VizResult<()> {
        let n = self.x.len();
        if n < 2 {
            return Err(VizError::malformed("background fit needs at least two bins"));
        }
        if self.y.len() != n || self.y_hat.len() != n {
            return Err(VizError::malformed(format!(
                "background fit has {n} bins but {} observed and {} fitted values",
                self.y.len(),
                self.y_hat.len()
            )));
        }
        Ok(())
    }
}

/// 绘制噪声分布柱状图, 叠加虚线表示的拟合结果和截断位置.
pub fn plot_bg_fit(fit: &BackgroundFit) -> VizResult<Document> {
    fit.validate()?;

    let width = fit.x[1] - fit.x[0];
    let left: Vec<f64> = fit.x.iter().map(|v| v - 0.5 * width).collect();
    let ylim = fit.ylim();

    let lo = left.iter().copied().chain([fit.x_cutoff]).fold(f64::INFINITY, f64::min);
    let hi = left
        .iter()
        .map(|v| v + width)
        .chain([fit.x_cutoff])
        .fold(f64::NEG_INFINITY, f64::max);
    let (x0, x1) = padded((lo, hi));
    let dpi = DEFAULT_DPI;

    draw_svg(FIGSIZE, dpi, |root| {
        let fs = points_to_px(9.0, dpi);
        let mut chart = ChartBuilder::on(root)
            .caption(
                "Noise distribution on the air mask, and fitted chi distribution",
                font(dpi, 1.3),
            )
            .margin(fs as u32)
            .x_label_area_size((fs * 3.0) as u32)
            .y_label_area_size((fs * 5.0) as u32)
            .build_cartesian_2d(x0..x1, ylim.0..ylim.1)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .label_style(font(dpi, 0.8))
            .axis_desc_style(font(dpi, 1.0))
            .x_desc("Intensity")
            .y_desc("Frequency")
            .draw()?;

        chart.draw_series(
            left.iter()
                .zip(fit.y.iter())
                .map(|(&l, &y)| Rectangle::new([(l, 0.0), (l + width, y)], MPL_BLUE.filled())),
        )?;

        let (dash, gap) = (stroke_px(3.7, dpi), stroke_px(1.6, dpi));
        let dashed = BLACK.stroke_width(stroke_px(1.2, dpi));
        chart.draw_series(DashedLineSeries::new(
            left.iter().copied().zip(fit.y_hat.iter().copied()),
            dash,
            gap,
            dashed,
        ))?;
        chart.draw_series(DashedLineSeries::new(
            [(fit.x_cutoff, ylim.0), (fit.x_cutoff, ylim.1)],
            dash,
            gap,
            dashed,
        ))?;
        Ok(())
    })
}

/// 读取 JSON 格式的拟合结果并绘图.
///
/// 内容无法解析时不返回错误, 而是返回内容为 [`BACKGROUND_PLACEHOLDER`] 的占位文档.
/// 文件本身无法读取时返回 `Io`.
pub fn plot_bg_dist<P: AsRef<Path>>(json_path: P) -> VizResult<Document> {
    let text = std::fs::read_to_string(json_path.as_ref())?;
    match BackgroundFit::from_json(&text).and_then(|fit| plot_bg_fit(&fit)) {
        Err(e @ VizError::MalformedInput { .. }) => {
            log::warn!("{}: {e}", json_path.as_ref().display());
            Ok(Document::placeholder(BACKGROUND_PLACEHOLDER))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"x": [1.0, 2.0, 3.0, 4.0], "y": [0.1, 0.4, 0.3, 0.2], "y_hat": [0.15, 0.35, 0.3, 0.15], "x_cutoff": 3.5}"#;

    fn write_tmp(name: &str, content: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn test_plot_payload() {
        let fit = BackgroundFit::from_json(PAYLOAD).unwrap();
        assert_eq!(fit.x_cutoff, 3.5);
        assert_eq!(fit.ylim(), (0.0, 1.1 * 0.4));
        let doc = plot_bg_fit(&fit).unwrap();
        assert!(!doc.is_placeholder());
        let s = doc.as_str();
        assert!(s.contains("fitted chi distribution"));
        assert!(s.contains("Intensity"));
        assert!(s.contains("Frequency"));
        assert!(s.to_ascii_lowercase().contains("#1f77b4"));
    }

    #[test]
    fn test_ylim_covers_fitted_curve() {
        let fit = BackgroundFit {
            x: vec![0.0, 1.0],
            y: vec![0.2, 0.3],
            y_hat: vec![0.5, 0.1],
            x_cutoff: 0.5,
        };
        assert_eq!(fit.ylim(), (0.0, 1.1 * 0.5));

        let flat = BackgroundFit {
            y: vec![0.0, 0.0],
            y_hat: vec![0.0, 0.0],
            ..fit
        };
        assert_eq!(flat.ylim(), (0.0, 1.0));
    }

    #[test]
    fn test_bad_json_degrades_to_placeholder() {
        let p = write_tmp("qc-berry-bg-bad.json", "{not json");
        let doc = plot_bg_dist(&p).unwrap();
        std::fs::remove_file(&p).ok();
        assert!(doc.is_placeholder());
        assert_eq!(
            doc.as_str(),
            "<p>Background noise fitting could not be plotted.</p>"
        );
    }

    #[test]
    fn test_inconsistent_payload_degrades() {
        let p = write_tmp(
            "qc-berry-bg-short.json",
            r#"{"x": [1.0], "y": [0.1], "y_hat": [0.1], "x_cutoff": 1.0}"#,
        );
        let doc = plot_bg_dist(&p).unwrap();
        std::fs::remove_file(&p).ok();
        assert!(doc.is_placeholder());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            plot_bg_dist("/definitely/not/here.json"),
            Err(VizError::Io(_))
        ));
    }
}
