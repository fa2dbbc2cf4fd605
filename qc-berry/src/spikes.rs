//! 尖峰对比网格.
//!
//! 对每个被标记的 `(t, z)` 坐标, 把第 `z` 层在 `t - 1`, `t`, `t + 1` 三个时间点的切片并排显示,
//! 强度空间的面板位于上方, 频域面板位于下方.

use ndarray::ArrayView2;

use crate::compose::{compose_panel, PanelSpec};
use crate::consts::{DEFAULT_SPIKE_COLUMNS, SPIKE_ROWS_PER_COLUMN};
use crate::data::{BoundsOverride, IntensityBounds, Volume, VolumeInput, VoxelGridAttr};
use crate::error::{VizError, VizResult};
use crate::render::{Colormap, Document, Layout, Renderer};

/// 尖峰坐标 `(t, z)`.
pub type SpikeCoordinate = (usize, usize);

/// 默认标签: 以秒为单位的时间 (3 位小数) 和层号.
pub fn default_label(seconds: f64, z: usize) -> String {
    format!("t={seconds:.3}s (z={z})")
}

/// 尖峰网格参数.
#[derive(Clone, Debug)]
pub struct SpikeOptions {
    /// 基础列数. 尖峰较多时会自动加一.
    pub columns: usize,

    /// 强度面板的颜色表.
    pub colormap: Colormap,

    /// 由 (时间, 层号) 生成强度面板标签.
    pub label: fn(f64, usize) -> String,
}

impl Default for SpikeOptions {
    fn default() -> Self {
        Self {
            columns: DEFAULT_SPIKE_COLUMNS,
            colormap: Colormap::GreysR,
            label: default_label,
        }
    }
}

/// 实际列数: 尖峰个数超过 `columns * 7` 时加一.
#[inline]
pub fn effective_columns(n: usize, columns: usize) -> usize {
    if n > columns * SPIKE_ROWS_PER_COLUMN {
        columns + 1
    } else {
        columns
    }
}

/// 网格行数: 尖峰个数超过列数时为 `ceil(n / columns)`, 否则为 1.
#[inline]
pub fn grid_rows(n: usize, columns: usize) -> usize {
    if n > columns {
        n.div_ceil(columns)
    } else {
        1
    }
}

/// 第 `z` 层在 `t - 1` 和 `t + 1` 处的切片. 超出时间范围时为 `None`.
fn neighbours(v: &Volume, z: usize, t: usize) -> (Option<ArrayView2<'_, f32>>, Option<ArrayView2<'_, f32>>) {
    let prev = (t > 0).then(|| v.axial_at(z, t - 1));
    let next = (t + 1 < v.len_t()).then(|| v.axial_at(z, t + 1));
    (prev, next)
}

fn check_inputs(volume: &Volume, transform: &Volume, coordinates: &[SpikeCoordinate]) -> VizResult<()> {
    if volume.is_3d() {
        return Err(VizError::invalid("spike plots need a 4D image"));
    }
    if volume.shape4() != transform.shape4() {
        return Err(VizError::invalid(format!(
            "image of shape {:?} and transform of shape {:?} differ",
            volume.shape4(),
            transform.shape4()
        )));
    }
    let (_, _, nz, nt) = volume.shape4();
    if let Some(&(t, z)) = coordinates.iter().find(|&&(t, z)| t >= nt || z >= nz) {
        return Err(VizError::invalid(format!(
            "spike coordinate (t={t}, z={z}) outside of {nt} volumes x {nz} slices"
        )));
    }
    Ok(())
}

/// 渲染尖峰对比网格.
///
/// 输入不是四维数据, 两者形状不同, 或坐标越界时返回 `InvalidInput`.
pub fn render_spikes<R, V, T>(
    renderer: &mut R,
    volume: V,
    transform: T,
    coordinates: &[SpikeCoordinate],
    options: &SpikeOptions,
) -> VizResult<Document>
where
    R: Renderer + ?Sized,
    V: Into<VolumeInput>,
    T: Into<VolumeInput>,
{
    if options.columns == 0 {
        return Err(VizError::invalid("spike grid needs at least one column"));
    }
    let volume = volume.into().resolve()?;
    let transform = transform.into().resolve()?;
    check_inputs(&volume, &transform, coordinates)?;

    let n = coordinates.len();
    let columns = effective_columns(n, options.columns);
    let rows = grid_rows(n, columns);
    log::debug!("{n} spikes in a {rows}x{columns} grid");

    let [sx, sy, _] = volume.spacing();
    let fixed = BoundsOverride::fixed(IntensityBounds::transform());

    let mut fragments = Vec::with_capacity(2 * n);
    for &(t, z) in coordinates {
        let (prev, next) = neighbours(&volume, z, t);
        let spec = PanelSpec {
            spacing: Some([sx, sy]),
            bounds: BoundsOverride::none(),
            colormap: options.colormap,
            label: Some((options.label)(t as f64 * volume.tr(), z)),
        };
        let panel = compose_panel(volume.axial_at(z, t), prev, next, &spec)?;
        fragments.push(renderer.render_panel(&panel)?);

        let (prev, next) = neighbours(&transform, z, t);
        let spec = PanelSpec {
            spacing: None,
            bounds: fixed,
            colormap: Colormap::Parula,
            label: None,
        };
        let panel = compose_panel(transform.axial_at(z, t), prev, next, &spec)?;
        fragments.push(renderer.render_panel(&panel)?);
    }

    renderer.compose_document(
        fragments,
        Layout::Grid {
            rows,
            columns,
            per_cell: 2,
        },
    )
}
