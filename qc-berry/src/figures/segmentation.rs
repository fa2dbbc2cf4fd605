//! 分割轮廓图: 在结构像的若干水平切片上叠加分割边界.

use itertools::Itertools;

use crate::data::{
    BoundsOverride, IntensityBounds, VolumeInput, VoxelGridAttr, WindowMode, WindowPercentiles,
};
use crate::error::{VizError, VizResult};
use crate::render::{Colormap, CutRowRequest, DisplayMode, Document, Layout, Renderer};

/// 默认切片数.
const DEFAULT_CUT_COUNT: usize = 8;

/// 分割轮廓图参数.
#[derive(Clone, Debug)]
pub struct SegmentationOptions {
    /// 显示窗口覆盖. 两端都未给定时使用第 10 和第 99 百分位数.
    pub bounds: BoundsOverride,

    /// 为真时上限改为第 70 百分位数, 以突出暗部.
    pub saturate: bool,

    /// 水平切片个数.
    pub cut_count: usize,

    /// 标题.
    pub title: Option<String>,

    /// 颜色表.
    pub colormap: Colormap,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            bounds: BoundsOverride::none(),
            saturate: false,
            cut_count: DEFAULT_CUT_COUNT,
            title: None,
            colormap: Colormap::GreysR,
        }
    }
}

impl SegmentationOptions {
    /// 解析显示窗口. 只给定一端时, 另一端取数据的最小值或最大值.
    fn resolve_bounds<'a, I>(&self, values: I) -> VizResult<IntensityBounds>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        let with = |lo, hi| WindowPercentiles {
            normal: (lo, hi),
            ..Default::default()
        };
        let (bounds, pct) = if self.saturate {
            let bounds = BoundsOverride {
                vmin: self.bounds.vmin,
                vmax: None,
            };
            (bounds, with(0.0, 70.0))
        } else if self.bounds.vmin.is_none() && self.bounds.vmax.is_none() {
            (self.bounds, with(10.0, 99.0))
        } else {
            (self.bounds, with(0.0, 100.0))
        };
        bounds.resolve_with(values, WindowMode::Normal, &pct)
    }
}

/// 在 `nz` 层中均匀选出至多 `count` 个不含两端的水平切片.
pub fn axial_cut_positions(nz: usize, count: usize) -> Vec<usize> {
    (1..=count)
        .map(|i| i * nz / (count + 1))
        .filter(|&z| z < nz)
        .dedup()
        .collect()
}

/// 绘制分割轮廓图.
///
/// 两个输入都必须是形状相同的三维数据, 否则返回 `InvalidInput`. 分割中非零的体素视为前景.
pub fn plot_segmentation<R, A, S>(
    renderer: &mut R,
    anat: A,
    segmentation: S,
    options: &SegmentationOptions,
) -> VizResult<Document>
where
    R: Renderer + ?Sized,
    A: Into<VolumeInput>,
    S: Into<VolumeInput>,
{
    let anat = anat.into().resolve()?;
    let seg = segmentation.into().resolve()?;
    let data = anat.view3()?;
    let labels = seg.view3()?;
    if anat.shape3() != seg.shape3() {
        return Err(VizError::invalid(format!(
            "segmentation of shape {:?} does not match image of shape {:?}",
            seg.shape3(),
            anat.shape3()
        )));
    }

    let bounds = options.resolve_bounds(data.iter())?;
    let mask = labels.mapv(|v| v != 0.0 && !v.is_nan());
    let cuts = axial_cut_positions(anat.len_z(), options.cut_count);
    let coords = cuts
        .iter()
        .map(|&z| anat.affine().apply([0.0, 0.0, z as f64])[2])
        .collect();
    log::debug!("segmentation contours on axial cuts {cuts:?}");

    let request = CutRowRequest {
        volume: data,
        spacing: anat.spacing(),
        mode: DisplayMode::Axial,
        cuts,
        coords,
        bounds,
        colormap: options.colormap,
        overlay: Some(mask.view()),
        title: options.title.as_deref(),
    };
    let row = renderer.render_cut_row(&request)?;
    renderer.compose_document(vec![row], Layout::Rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Volume;
    use crate::render::testing::{Call, RecordingRenderer};
    use ndarray::Array3;

    fn anat() -> Volume {
        // 0..=200 的值, 每个体素一个.
        let data = Array3::from_shape_fn((67, 1, 3), |(x, _, z)| (x * 3 + z) as f32);
        Volume::from_array3(data, [1.0; 3], None)
    }

    fn seg() -> Volume {
        let mut data = Array3::<f32>::zeros((67, 1, 3));
        data[(10, 0, 1)] = 1.0;
        Volume::from_array3(data, [1.0; 3], None)
    }

    fn row_bounds(r: &RecordingRenderer) -> IntensityBounds {
        match r.rows()[0] {
            Call::Row { bounds, overlay, .. } => {
                assert!(*overlay);
                *bounds
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_cut_positions() {
        assert_eq!(axial_cut_positions(90, 8), vec![10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(axial_cut_positions(4, 8), vec![0, 1, 2, 3]);
        assert!(axial_cut_positions(10, 0).is_empty());
    }

    #[test]
    fn test_default_window() {
        let mut r = RecordingRenderer::default();
        plot_segmentation(&mut r, anat(), seg(), &SegmentationOptions::default()).unwrap();
        let b = row_bounds(&r);
        assert!((b.vmin() - 20.0).abs() < 1e-9);
        assert!((b.vmax() - 198.0).abs() < 1e-9);
    }

    #[test]
    fn test_saturate_and_partial_window() {
        let mut r = RecordingRenderer::default();
        let saturate = SegmentationOptions {
            saturate: true,
            ..Default::default()
        };
        plot_segmentation(&mut r, anat(), seg(), &saturate).unwrap();
        let b = row_bounds(&r);
        assert_eq!(b.vmin(), 0.0);
        assert!((b.vmax() - 140.0).abs() < 1e-9);

        let mut r = RecordingRenderer::default();
        let lower = SegmentationOptions {
            bounds: BoundsOverride {
                vmin: Some(50.0),
                vmax: None,
            },
            ..Default::default()
        };
        plot_segmentation(&mut r, anat(), seg(), &lower).unwrap();
        let b = row_bounds(&r);
        assert_eq!((b.vmin(), b.vmax()), (50.0, 200.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut r = RecordingRenderer::default();
        let other = Volume::from_array3(Array3::zeros((67, 1, 4)), [1.0; 3], None);
        assert!(matches!(
            plot_segmentation(&mut r, anat(), other, &SegmentationOptions::default()),
            Err(VizError::InvalidInput(_))
        ));
    }
}
