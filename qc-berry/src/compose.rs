//! 单个面板的合成: 目标切片与左右两侧的相邻切片并排显示.

use ndarray::{concatenate, Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::data::{BoundsOverride, WindowMode};
use crate::error::VizResult;
use crate::render::Colormap;
use crate::Idx2d;

/// 合成面板的参数.
#[derive(Clone, Debug, Default)]
pub struct PanelSpec {
    /// 切片平面内的体素间距 `[sx, sy]` (毫米). 缺省为 `[1, 1]`.
    pub spacing: Option<[f64; 2]>,

    /// 显示窗口. 未给定的一端从目标切片估计.
    pub bounds: BoundsOverride,

    /// 颜色表.
    pub colormap: Colormap,

    /// 底部居中的标签.
    pub label: Option<String>,
}

/// 合成后的 RGB 面板.
///
/// 像素按显示顺序存储: 第 0 行位于画面最上方.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelImage {
    pixels: Array3<u8>,
    extent: (f64, f64),
    label: Option<String>,
}

impl PanelImage {
    /// 面板分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let (h, w, _) = self.pixels.dim();
        (h, w)
    }

    /// 物理尺寸 (宽, 高), 以毫米为单位.
    #[inline]
    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }

    /// 标签.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// 获得像素的一份不可变 shallow copy, 形状为 `(高, 宽, 3)`.
    #[inline]
    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// 获取 `(行, 列)` 处的颜色. 越界时返回 `None`.
    #[inline]
    pub fn pixel(&self, (r, c): Idx2d) -> Option<[u8; 3]> {
        let (h, w) = self.shape();
        (r < h && c < w).then(|| [0, 1, 2].map(|ch| self.pixels[(r, c, ch)]))
    }
}

/// 合成 `[prev | target | next]` 面板.
///
/// 缺失的相邻切片用与 `target` 同形状的全 1 切片代替. 三个切片共用同一个显示窗口.
/// 相邻切片形状与 `target` 不一致时返回 `ShapeMismatch`.
pub fn compose_panel(
    target: ArrayView2<f32>,
    prev: Option<ArrayView2<f32>>,
    next: Option<ArrayView2<f32>>,
    spec: &PanelSpec,
) -> VizResult<PanelImage> {
    let bounds = spec.bounds.resolve(target.iter(), WindowMode::Normal)?;

    let blank = Array2::<f32>::ones(target.raw_dim());
    let prev = match prev {
        Some(p) => p.reborrow(),
        None => blank.view(),
    };
    let next = match next {
        Some(n) => n.reborrow(),
        None => blank.view(),
    };

    // (3 * X, Y) -> (Y, 3 * X). 原点位于左下角.
    let combined = concatenate(Axis(0), &[prev, target.reborrow(), next])?;
    let display = combined.t();
    let (h, w) = display.dim();

    let mut pixels = Array3::<u8>::zeros((h, w, 3));
    for ((r, c), &v) in display.indexed_iter() {
        let rgb = spec.colormap.lookup(bounds.normalize(f64::from(v)));
        let row = h - 1 - r;
        for (ch, value) in rgb.into_iter().enumerate() {
            pixels[(row, c, ch)] = value;
        }
    }

    // 平面内间距交换后再按形状换算物理尺寸.
    let [sa, sb] = spec.spacing.map(|[sx, sy]| [sy, sx]).unwrap_or([1.0, 1.0]);
    let (x_len, y_len) = target.dim();
    let phys = [sa * x_len as f64, sb * y_len as f64];

    Ok(PanelImage {
        pixels,
        extent: (phys[1] * 3.0, phys[0]),
        label: spec.label.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IntensityBounds;
    use crate::error::VizError;
    use ndarray::Array2;

    fn ramp(x: usize, y: usize) -> Array2<f32> {
        Array2::from_shape_fn((x, y), |(i, j)| (i * y + j) as f32)
    }

    #[test]
    fn test_blank_neighbour_is_uniform() {
        let target = ramp(4, 5);
        let spec = PanelSpec {
            bounds: BoundsOverride::fixed(IntensityBounds::new(0.0, 10.0).unwrap()),
            ..Default::default()
        };
        let panel = compose_panel(target.view(), None, Some(target.view()), &spec).unwrap();
        assert_eq!(panel.shape(), (5, 12));

        let expected = Colormap::GreysR.lookup(Some(0.1));
        for r in 0..5 {
            for c in 0..4 {
                assert_eq!(panel.pixel((r, c)), Some(expected));
            }
        }
        // 中间部分不应是空白.
        assert_ne!(panel.pixel((4, 4)), panel.pixel((0, 7)));
    }

    #[test]
    fn test_lower_left_origin() {
        let mut target = Array2::<f32>::zeros((2, 3));
        target[(0, 0)] = 1.0;
        let spec = PanelSpec {
            bounds: BoundsOverride::fixed(IntensityBounds::new(0.0, 1.0).unwrap()),
            ..Default::default()
        };
        let panel = compose_panel(target.view(), None, None, &spec).unwrap();
        // target[(0, 0)] 在中间部分的左下角.
        assert_eq!(panel.pixel((2, 2)), Some([255, 255, 255]));
        assert_eq!(panel.pixel((0, 2)), Some([0, 0, 0]));
    }

    #[test]
    fn test_extent_swaps_spacing() {
        let target = ramp(4, 4);
        let spec = PanelSpec {
            spacing: Some([2.0, 3.0]),
            label: Some("t=0.000s (z=1)".to_string()),
            ..Default::default()
        };
        let panel = compose_panel(target.view(), None, None, &spec).unwrap();
        assert_eq!(panel.extent(), (2.0 * 4.0 * 3.0, 3.0 * 4.0));
        assert_eq!(panel.label(), Some("t=0.000s (z=1)"));
    }

    #[test]
    fn test_both_neighbours_missing() {
        let volume = ndarray::Array3::from_shape_fn((3, 2, 4), |(x, y, z)| (x + y + z) as f32);
        let spec = PanelSpec {
            bounds: BoundsOverride::fixed(IntensityBounds::new(0.0, 4.0).unwrap()),
            ..Default::default()
        };
        let target = volume.index_axis(Axis(2), 1);
        let panel = compose_panel(target, None, None, &spec).unwrap();
        assert_eq!(panel.shape(), (2, 9));

        // 两侧的全 1 切片.
        let blank = Colormap::GreysR.lookup(Some(0.25));
        for r in 0..2 {
            for c in (0..3).chain(6..9) {
                assert_eq!(panel.pixel((r, c)), Some(blank));
            }
        }
    }

    #[test]
    fn test_mismatched_neighbour() {
        let target = ramp(4, 4);
        let other = ramp(4, 3);
        let spec = PanelSpec::default();
        let res = compose_panel(target.view(), Some(other.view()), None, &spec);
        assert!(matches!(res, Err(VizError::ShapeMismatch(_))));
    }
}
