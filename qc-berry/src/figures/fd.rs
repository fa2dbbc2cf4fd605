//! 逐帧位移曲线图.

use std::path::Path;

use plotters::prelude::*;

use super::stats::Sample;
use super::{distplot, draw_svg, fmt_g, font, padded, points_to_px, stroke_px, Marker, MPL_BLUE};
use crate::consts::{DEFAULT_DPI, DINA4_LANDSCAPE};
use crate::error::VizResult;
use crate::motion::{compute_fd_from_path, FdSeries};
use crate::render::Document;

/// 读取运动参数文件, 绘制 FD 曲线图. 参见 [`plot_fd_series`].
pub fn plot_fd<P: AsRef<Path>>(fd_path: P, radius: f64, mean_fd_dist: Option<&[f64]>) -> VizResult<Document> {
    let fd = compute_fd_from_path(fd_path, radius)?;
    plot_fd_series(&fd, mean_fd_dist)
}

/// 绘制 FD 曲线图 (DIN A4 横向).
///
/// 第一行左侧 3/4 为 FD 随帧号变化的折线, 右侧为共享纵轴范围的 FD 分布.
/// 给定组水平平均 FD 分布时, 第二行绘制该分布, 并在本受试者的平均 FD 处画竖线.
pub fn plot_fd_series(fd: &FdSeries, mean_fd_dist: Option<&[f64]>) -> VizResult<Document> {
    let dpi = DEFAULT_DPI;
    let values = fd.values();
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ylim = padded((lo, hi));
    let xmax = values.len().max(1) as f64;

    draw_svg(DINA4_LANDSCAPE, dpi, |root| {
        let rows = root.split_evenly((if mean_fd_dist.is_some() { 2 } else { 1 }, 1));
        let (line_area, dist_area) = rows[0].split_horizontally(rows[0].dim_in_pixel().0 * 3 / 4);

        let fs = points_to_px(9.0, dpi);
        let mut chart = ChartBuilder::on(&line_area)
            .margin(fs as u32)
            .x_label_area_size((fs * 3.0) as u32)
            .y_label_area_size((fs * 5.0) as u32)
            .build_cartesian_2d(0.0..xmax, ylim.0..ylim.1)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .label_style(font(dpi, 0.8))
            .axis_desc_style(font(dpi, 1.0))
            .x_desc("Frame number")
            .y_desc("Frame Displacement [mm]")
            .draw()?;
        chart.draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            MPL_BLUE.stroke_width(stroke_px(1.5, dpi)),
        ))?;

        let sample = Sample::new(values.iter().copied());
        distplot(&dist_area, dpi, &sample, true, Some(ylim), None, None)?;

        if let (Some(dist), Some(area)) = (mean_fd_dist, rows.get(1)) {
            let group = Sample::new(dist.iter().copied());
            let mean = fd.mean();
            let label = format!("mean FD = {}", fmt_g(mean));
            distplot(
                area,
                dpi,
                &group,
                false,
                None,
                Some("Mean Frame Displacement (over all subjects) [mm]"),
                Some(Marker {
                    value: mean,
                    label: &label,
                }),
            )?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{compute_fd, MotionParameters};

    fn series() -> FdSeries {
        let params: MotionParameters = "0 0 0 0 0 0\n0.5 0 0 0 0 0\n0.5 0.2 0 0 0 1\n0 0 0 0 0 0\n"
            .parse()
            .unwrap();
        compute_fd(&params, 50.0)
    }

    #[test]
    fn test_single_row_layout() {
        let doc = plot_fd_series(&series(), None).unwrap();
        let s = doc.as_str();
        assert!(s.contains("Frame Displacement [mm]"));
        assert!(s.contains("Frame number"));
        assert!(!s.contains("over all subjects"));
        // DIN A4 横向, 300 dpi.
        assert!(s.starts_with("<svg"));
        assert!(s.contains(r#"width="3507""#));
        assert!(s.contains(r#"height="2481""#));
        assert_eq!((doc.width(), doc.height()), (3507.0, 2481.0));
    }

    #[test]
    fn test_group_distribution_row() {
        let dist = [0.1, 0.15, 0.2, 0.4, 0.3, 0.25];
        let doc = plot_fd_series(&series(), Some(&dist)).unwrap();
        assert!(doc.as_str().contains("over all subjects"));
        assert!(doc.as_str().contains("mean FD = "));
        assert_eq!(doc, plot_fd_series(&series(), Some(&dist)).unwrap());
    }

    #[test]
    fn test_empty_series() {
        let fd = compute_fd(&MotionParameters::new(vec![]), 50.0);
        let doc = plot_fd_series(&fd, Some(&[0.1, 0.2, 0.3])).unwrap();
        assert!(!doc.is_placeholder());
        assert!(!doc.as_str().contains("mean FD = "));
    }

    #[test]
    fn test_missing_file() {
        assert!(plot_fd("/definitely/not/here.par", 50.0, None).is_err());
    }
}
