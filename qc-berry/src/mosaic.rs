//! 切片拼图.
//!
//! 把三维体数据裁剪到包围盒, 抽取至多 [`MAX_AXIAL_CUTS`] 个水平切片, 按列数分行后逐行交给渲染后端,
//! 最后可选地追加一行矢状切片.

use ndarray::ArrayView3;

use crate::consts::{DEFAULT_MOSAIC_COLUMNS, MAX_AXIAL_CUTS};
use crate::data::{
    AxialTrim, BoundingBox, BoundsOverride, IntensityBounds, Mask, Volume, VolumeInput,
    VoxelGridAttr, WindowMode,
};
use crate::error::{VizError, VizResult};
use crate::render::{Colormap, CutRowRequest, DisplayMode, Document, Fragment, Layout, Renderer};

/// 包围盒来源.
#[derive(Clone, Debug)]
pub enum BboxSource {
    /// 直接给定.
    Explicit(BoundingBox),

    /// 取掩码体数据中非零区域的最小包围盒.
    Mask(VolumeInput),
}

impl From<BoundingBox> for BboxSource {
    #[inline]
    fn from(value: BoundingBox) -> Self {
        Self::Explicit(value)
    }
}

/// 拼图参数.
#[derive(Clone, Debug)]
pub struct MosaicOptions {
    /// 每行切片个数, 必须为正.
    pub columns: usize,

    /// 包围盒. 缺省时使用轴向裁剪启发式.
    pub bbox: Option<BboxSource>,

    /// 叠加显示的分割. 非零体素视为前景.
    pub overlay: Option<VolumeInput>,

    /// 显示窗口覆盖.
    pub bounds: BoundsOverride,

    /// 窗口估计模式.
    pub mode: WindowMode,

    /// 颜色表.
    pub colormap: Colormap,

    /// 标题, 只显示在第一行.
    pub title: Option<String>,

    /// 是否追加矢状切片行.
    pub sagittal: bool,

    /// 轴向裁剪启发式.
    pub trim: AxialTrim,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            columns: DEFAULT_MOSAIC_COLUMNS,
            bbox: None,
            overlay: None,
            bounds: BoundsOverride::none(),
            mode: WindowMode::Normal,
            colormap: Colormap::GreysR,
            title: None,
            sagittal: true,
            trim: AxialTrim::default(),
        }
    }
}

/// 从 `n` 个水平切片中选出要显示的索引.
///
/// 个数超过 [`MAX_AXIAL_CUTS`] 时每次丢弃一半 (步长加倍), 然后从头部丢弃 `len % columns` 个,
/// 使结果恰好能排成整行. 返回值严格递增. `columns == 0` 时返回空.
pub fn select_axial_cuts(n: usize, columns: usize) -> Vec<usize> {
    if columns == 0 {
        return Vec::new();
    }
    let mut step = 1;
    while n.div_ceil(step) > MAX_AXIAL_CUTS {
        step *= 2;
    }
    let mut cuts: Vec<usize> = (0..n).step_by(step).collect();
    cuts.drain(..cuts.len() % columns);
    cuts
}

/// 矢状切片位置: 以 `nx / (columns + 1)` (至少为 1) 为步长, 丢弃最后一个.
///
/// 体数据过窄而没有剩余位置时, 取中间一列 `nx / 2`.
pub fn sagittal_cuts(nx: usize, columns: usize) -> Vec<usize> {
    let step = (nx / (columns + 1)).max(1);
    let mut cuts: Vec<usize> = (step..nx).step_by(step).collect();
    cuts.pop();
    if cuts.is_empty() && nx > 0 {
        cuts.push(nx / 2);
    }
    cuts
}

/// 非零且非 NaN 的体素为前景.
fn nonzero(view: ArrayView3<f32>) -> Mask {
    view.mapv(|v| v != 0.0 && !v.is_nan())
}

/// 解析包围盒.
fn resolve_bbox(volume: &Volume, options: &mut MosaicOptions) -> VizResult<BoundingBox> {
    let shape = volume.shape3();
    let bbox = match options.bbox.take() {
        Some(BboxSource::Explicit(b)) => {
            b.validate(shape)?;
            b
        }
        Some(BboxSource::Mask(input)) => {
            let mask = input.resolve()?;
            if mask.shape3() != shape {
                return Err(VizError::invalid(format!(
                    "bounding box mask of shape {:?} does not match volume of shape {shape:?}",
                    mask.shape3()
                )));
            }
            BoundingBox::from_mask(&nonzero(mask.view3()?))
                .ok_or_else(|| VizError::invalid("bounding box mask is empty"))?
        }
        None => BoundingBox::heuristic(shape, &options.trim),
    };
    log::debug!("mosaic bounding box {:?}", bbox.ranges());
    Ok(bbox)
}

/// 解析并裁剪叠加掩码.
fn resolve_overlay(volume: &Volume, input: VolumeInput, bbox: &BoundingBox) -> VizResult<Mask> {
    let overlay = input.resolve()?;
    if overlay.shape3() != volume.shape3() {
        return Err(VizError::invalid(format!(
            "overlay of shape {:?} does not match volume of shape {:?}",
            overlay.shape3(),
            volume.shape3()
        )));
    }
    Ok(nonzero(overlay.crop3(bbox)?.view3()?))
}

/// 渲染切片拼图.
///
/// 单个输入出错时返回 `InvalidInput`: 文件无法读取, 不是三维数据, `columns == 0`,
/// 包围盒掩码或叠加掩码形状不符, 包围盒掩码为空, 或显式包围盒越界.
/// 裁剪后切片不足一行时不渲染水平切片行, 但仍然渲染矢状切片行.
pub fn render_mosaic<R, I>(renderer: &mut R, input: I, mut options: MosaicOptions) -> VizResult<Document>
where
    R: Renderer + ?Sized,
    I: Into<VolumeInput>,
{
    let columns = options.columns;
    if columns == 0 {
        return Err(VizError::invalid("mosaic needs at least one column"));
    }
    let volume = input.into().resolve()?;
    volume.view3()?;

    let bbox = resolve_bbox(&volume, &mut options)?;
    let cropped = volume.crop3(&bbox)?;
    let overlay = match options.overlay.take() {
        Some(o) => Some(resolve_overlay(&volume, o, &bbox)?),
        None => None,
    };

    let data = cropped.view3()?;
    let bounds: IntensityBounds = options.bounds.resolve(data.iter(), options.mode)?;
    let affine = cropped.affine();
    let (nx, _, nz) = cropped.shape3();

    let request = |mode: DisplayMode, cuts: Vec<usize>, coords: Vec<f64>, title| CutRowRequest {
        volume: data,
        spacing: cropped.spacing(),
        mode,
        cuts,
        coords,
        bounds,
        colormap: options.colormap,
        overlay: overlay.as_ref().map(|m| m.view()),
        title,
    };

    let z_cuts = select_axial_cuts(nz, columns);
    log::debug!(
        "mosaic: {} of {nz} axial slices in rows of {columns}",
        z_cuts.len()
    );

    let mut fragments: Vec<Fragment> = Vec::with_capacity(z_cuts.len() / columns + 1);
    for (row, cuts) in z_cuts.chunks_exact(columns).enumerate() {
        let coords = cuts
            .iter()
            .map(|&z| affine.apply([0.0, 0.0, z as f64])[2])
            .collect();
        let title = if row == 0 { options.title.as_deref() } else { None };
        let req = request(DisplayMode::Axial, cuts.to_vec(), coords, title);
        fragments.push(renderer.render_cut_row(&req)?);
    }

    if options.sagittal {
        let x_cuts = sagittal_cuts(nx, columns);
        if x_cuts.is_empty() {
            log::debug!("mosaic: volume too narrow for a sagittal row");
        } else {
            let coords = x_cuts
                .iter()
                .map(|&x| affine.apply([x as f64, 0.0, 0.0])[0])
                .collect();
            let req = request(DisplayMode::Sagittal, x_cuts, coords, None);
            fragments.push(renderer.render_cut_row(&req)?);
        }
    }

    renderer.compose_document(fragments, Layout::Rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Call, RecordingRenderer};
    use crate::render::SvgRenderer;
    use ndarray::{Array3, Array4};

    fn volume(shape: (usize, usize, usize)) -> Volume {
        let data = Array3::from_shape_fn(shape, |(x, y, z)| (x * 3 + y * 5 + z) as f32);
        Volume::from_array3(data, [1.0, 1.0, 2.0], None)
    }

    #[test]
    fn test_select_axial_cuts() {
        let cuts = select_axial_cuts(40, 6);
        assert_eq!(cuts.len(), 18);
        assert_eq!(cuts[0], 4);
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(select_axial_cuts(30, 6), (0..30).collect::<Vec<_>>());
        assert_eq!(select_axial_cuts(100, 6).len(), 24);
        assert!(select_axial_cuts(5, 6).is_empty());
        assert!(select_axial_cuts(10, 0).is_empty());
    }

    #[test]
    fn test_sagittal_cuts() {
        assert_eq!(sagittal_cuts(64, 6), vec![9, 18, 27, 36, 45, 54]);
        assert_eq!(sagittal_cuts(3, 6), vec![1]);
        assert_eq!(sagittal_cuts(2, 6), vec![1]);
        assert_eq!(sagittal_cuts(1, 6), vec![0]);
        assert!(sagittal_cuts(0, 6).is_empty());
    }

    #[test]
    fn test_narrow_volume_keeps_one_sagittal_row() {
        for nx in [1, 2] {
            let mut r = RecordingRenderer::default();
            render_mosaic(&mut r, volume((nx, 8, 12)), MosaicOptions::default()).unwrap();
            let sagittal: Vec<_> = r
                .rows()
                .into_iter()
                .filter(|c| matches!(c, Call::Row { mode: DisplayMode::Sagittal, .. }))
                .collect();
            assert_eq!(sagittal.len(), 1);
            let Call::Row { cuts, .. } = sagittal[0] else {
                unreachable!()
            };
            assert_eq!(cuts, &vec![nx / 2]);
        }
    }

    #[test]
    fn test_rows_and_title() {
        let mut r = RecordingRenderer::default();
        let options = MosaicOptions {
            title: Some("sub-01".to_string()),
            ..Default::default()
        };
        render_mosaic(&mut r, volume((16, 16, 40)), options).unwrap();

        let rows = r.rows();
        assert_eq!(rows.len(), 4);
        for (i, call) in rows.iter().enumerate() {
            let Call::Row { mode, cuts, title, .. } = call else {
                unreachable!()
            };
            assert_eq!(*mode, if i < 3 { DisplayMode::Axial } else { DisplayMode::Sagittal });
            assert_eq!(cuts.len(), 6);
            assert_eq!(title.is_some(), i == 0);
        }
        let Call::Row { cuts, coords, .. } = rows[0] else {
            unreachable!()
        };
        assert_eq!(cuts, &vec![4, 6, 8, 10, 12, 14]);
        assert_eq!(coords, &vec![8.0, 12.0, 16.0, 20.0, 24.0, 28.0]);
        assert_eq!(
            r.calls.last(),
            Some(&Call::Compose {
                fragments: 4,
                layout: Layout::Rows
            })
        );
    }

    #[test]
    fn test_short_box_keeps_sagittal_row() {
        let mut r = RecordingRenderer::default();
        let options = MosaicOptions {
            bbox: Some(BoundingBox::new([(0, 16), (0, 16), (10, 13)]).into()),
            ..Default::default()
        };
        render_mosaic(&mut r, volume((16, 16, 40)), options).unwrap();
        let rows = r.rows();
        assert_eq!(rows.len(), 1);
        assert!(matches!(
            rows[0],
            Call::Row {
                mode: DisplayMode::Sagittal,
                ..
            }
        ));
    }

    #[test]
    fn test_long_axis_is_trimmed_and_origin_moved() {
        let mut r = RecordingRenderer::default();
        let options = MosaicOptions {
            sagittal: false,
            ..Default::default()
        };
        render_mosaic(&mut r, volume((8, 8, 100)), options).unwrap();
        // 100 - 2 * 15 = 70 层, 抽稀到 35 层, 再丢弃 5 层.
        let rows = r.rows();
        assert_eq!(rows.len(), 5);
        let Call::Row { cuts, coords, .. } = rows[0] else {
            unreachable!()
        };
        assert_eq!(cuts[0], 10);
        assert_eq!(coords[0], (15.0 + 10.0) * 2.0);
    }

    #[test]
    fn test_mask_bbox_and_overlay() {
        let mut mask = Array3::<f32>::zeros((16, 16, 40));
        mask.slice_mut(ndarray::s![2..10, 3..12, 5..35]).fill(1.0);
        let options = MosaicOptions {
            bbox: Some(BboxSource::Mask(Volume::from_array3(mask.clone(), [1.0; 3], None).into())),
            overlay: Some(Volume::from_array3(mask, [1.0; 3], None).into()),
            bounds: BoundsOverride {
                vmin: Some(0.0),
                vmax: None,
            },
            ..Default::default()
        };
        let mut r = RecordingRenderer::default();
        render_mosaic(&mut r, volume((16, 16, 40)), options).unwrap();
        let rows = r.rows();
        // 30 层可以直接排成 5 行.
        assert_eq!(rows.len(), 6);
        let Call::Row { bounds, overlay, .. } = rows[0] else {
            unreachable!()
        };
        assert!(*overlay);
        assert_eq!(bounds.vmin(), 0.0);
        assert!(bounds.vmax() > 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut r = RecordingRenderer::default();
        let zero = MosaicOptions {
            columns: 0,
            ..Default::default()
        };
        assert!(matches!(
            render_mosaic(&mut r, volume((8, 8, 8)), zero),
            Err(VizError::InvalidInput(_))
        ));

        let v4 = Volume::from_array4(Array4::zeros((8, 8, 8, 2)), [1.0; 3], 2.0, None);
        assert!(matches!(
            render_mosaic(&mut r, v4, MosaicOptions::default()),
            Err(VizError::InvalidInput(_))
        ));

        let empty = MosaicOptions {
            bbox: Some(BboxSource::Mask(
                Volume::from_array3(Array3::zeros((8, 8, 8)), [1.0; 3], None).into(),
            )),
            ..Default::default()
        };
        assert!(matches!(
            render_mosaic(&mut r, volume((8, 8, 8)), empty),
            Err(VizError::InvalidInput(_))
        ));

        let mismatched = MosaicOptions {
            overlay: Some(Volume::from_array3(Array3::zeros((8, 8, 7)), [1.0; 3], None).into()),
            ..Default::default()
        };
        assert!(matches!(
            render_mosaic(&mut r, volume((8, 8, 8)), mismatched),
            Err(VizError::InvalidInput(_))
        ));

        let outside = MosaicOptions {
            bbox: Some(BoundingBox::new([(0, 8), (0, 8), (0, 9)]).into()),
            ..Default::default()
        };
        assert!(matches!(
            render_mosaic(&mut r, volume((8, 8, 8)), outside),
            Err(VizError::InvalidInput(_))
        ));
        assert!(r.rows().is_empty());
    }

    #[test]
    fn test_svg_output_is_deterministic() {
        let render = || {
            let mut r = SvgRenderer::default();
            let options = MosaicOptions {
                columns: 3,
                title: Some("anat".to_string()),
                ..Default::default()
            };
            render_mosaic(&mut r, volume((6, 5, 9)), options).unwrap()
        };
        let (a, b) = (render(), render());
        assert!(!a.is_placeholder());
        assert!(a.as_str().starts_with("<svg"));
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_svg_overlay_draws_red_contour() {
        let mut mask = Array3::<f32>::zeros((6, 5, 9));
        mask.slice_mut(ndarray::s![1..5, 1..4, ..]).fill(1.0);
        let render = |overlay: Option<Volume>| {
            let mut r = SvgRenderer::default();
            let options = MosaicOptions {
                columns: 3,
                overlay: overlay.map(Into::into),
                ..Default::default()
            };
            render_mosaic(&mut r, volume((6, 5, 9)), options).unwrap()
        };

        let with = render(Some(Volume::from_array3(mask, [1.0, 1.0, 2.0], None)));
        assert!(with.as_str().contains(r##"fill="#e41a1c""##));
        let without = render(None);
        assert!(!without.as_str().contains("#e41a1c"));
    }
}
