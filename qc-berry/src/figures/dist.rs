//! 掩码内数值分布图.

use plotters::prelude::*;

use super::stats::{Histogram, Sample};
use super::{distplot, draw_svg, font, fmt_g, padded, points_to_px, Marker, MPL_BLUE};
use crate::consts::{DEFAULT_DPI, DINA4_LANDSCAPE};
use crate::data::{Volume, VolumeInput, VoxelGridAttr};
use crate::error::{VizError, VizResult};
use crate::render::Document;

/// 上方直方图的分箱数.
const DIST_BINS: usize = 100;

/// 取出 `mask > 0` 且不为 NaN 的体素值. 两者形状不同时返回 `InvalidInput`.
pub fn values_inside_mask(main: &Volume, mask: &Volume) -> VizResult<Vec<f64>> {
    if main.shape4() != mask.shape4() {
        return Err(VizError::invalid(format!(
            "mask of shape {:?} does not match image of shape {:?}",
            mask.shape4(),
            main.shape4()
        )));
    }
    Ok(main
        .data()
        .iter()
        .zip(mask.data().iter())
        .filter(|&(v, &m)| !v.is_nan() && m > 0.0)
        .map(|(&v, _)| f64::from(v))
        .collect())
}

/// 读取图像和掩码, 绘制掩码内的数值分布. 参见 [`plot_dist_values`].
pub fn plot_dist<M, K>(
    main: M,
    mask: K,
    xlabel: &str,
    distribution: &[f64],
    xlabel2: &str,
) -> VizResult<Document>
where
    M: Into<VolumeInput>,
    K: Into<VolumeInput>,
{
    let main = main.into().resolve()?;
    let mask = mask.into().resolve()?;
    let values = values_inside_mask(&main, &mask)?;
    plot_dist_values(&values, xlabel, distribution, xlabel2)
}

/// 上方为 `values` 的 100 箱计数直方图; 下方为组水平分布 `distribution`,
/// 并在 `values` 的中位数处画竖线.
///
/// `values` 中没有有限值时返回 `EmptyMask`.
pub fn plot_dist_values(values: &[f64], xlabel: &str, distribution: &[f64], xlabel2: &str) -> VizResult<Document> {
    let sample = Sample::new(values.iter().copied());
    let median = sample.median()?;
    let label = fmt_g(median);
    let dpi = DEFAULT_DPI;

    draw_svg(DINA4_LANDSCAPE, dpi, |root| {
        let rows = root.split_evenly((2, 1));

        if let Some(hist) = Histogram::new(&sample, DIST_BINS) {
            let edges = hist.edges();
            let peak = hist.counts().iter().copied().max().unwrap_or(0) as f64;
            let (x0, x1) = padded((edges[0], edges[edges.len() - 1]));
            let fs = points_to_px(9.0, dpi);
            let mut chart = ChartBuilder::on(&rows[0])
                .margin(fs as u32)
                .x_label_area_size((fs * 3.0) as u32)
                .y_label_area_size((fs * 5.0) as u32)
                .build_cartesian_2d(x0..x1, 0.0..peak.max(1.0) * 1.05)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .label_style(font(dpi, 0.8))
                .axis_desc_style(font(dpi, 1.0))
                .x_desc(xlabel)
                .draw()?;
            chart.draw_series(
                hist.counts()
                    .iter()
                    .zip(edges.windows(2))
                    .map(|(&c, e)| Rectangle::new([(e[0], 0.0), (e[1], c as f64)], MPL_BLUE.mix(0.4).filled())),
            )?;
        }

        let group = Sample::new(distribution.iter().copied());
        distplot(
            &rows[1],
            dpi,
            &group,
            false,
            None,
            Some(xlabel2),
            Some(Marker {
                value: median,
                label: &label,
            }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_values_inside_mask() {
        let mut data = Array3::from_shape_fn((2, 2, 2), |(x, y, z)| (x + 2 * y + 4 * z) as f32);
        data[(1, 1, 1)] = f32::NAN;
        let mut mask = Array3::<f32>::zeros((2, 2, 2));
        mask[(0, 0, 1)] = 1.0;
        mask[(1, 1, 1)] = 2.0;
        mask[(1, 0, 0)] = -1.0;

        let main = Volume::from_array3(data, [1.0; 3], None);
        let mask = Volume::from_array3(mask, [1.0; 3], None);
        assert_eq!(values_inside_mask(&main, &mask).unwrap(), vec![4.0]);

        let other = Volume::from_array3(Array3::zeros((2, 2, 3)), [1.0; 3], None);
        assert!(matches!(
            values_inside_mask(&main, &other),
            Err(VizError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plot_dist_values() {
        let values: Vec<f64> = (0..500).map(|i| f64::from(i % 37)).collect();
        let dist = [10.0, 12.0, 18.0, 20.0, 17.0];
        let doc = plot_dist_values(&values, "Intensity", &dist, "Median (all subjects)").unwrap();
        let s = doc.as_str();
        assert!(s.starts_with("<svg"));
        assert!(s.contains("Intensity"));
        assert!(s.contains("Median (all subjects)"));
        assert!(s.to_ascii_lowercase().contains("#1f77b4"));
        assert_eq!(doc, plot_dist_values(&values, "Intensity", &dist, "Median (all subjects)").unwrap());
    }

    #[test]
    fn test_empty_values() {
        assert!(matches!(
            plot_dist_values(&[f64::NAN], "x", &[1.0, 2.0], "y"),
            Err(VizError::EmptyMask)
        ));
    }
}
