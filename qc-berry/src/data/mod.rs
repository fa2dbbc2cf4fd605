use std::path::{Path, PathBuf};

use ndarray::{s, Array3, Array4, ArrayView2, ArrayView3, ArrayView4, Axis, Ix4};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::{VizError, VizResult};
use crate::{Idx3d, Idx4d};

mod affine;
pub mod bbox;
pub mod window;

pub use affine::Affine;
pub use bbox::{AxialTrim, BoundingBox};
pub use window::{BoundsOverride, IntensityBounds, WindowMode, WindowPercentiles};

/// 三维布尔掩码, 按 `(x, y, z)` 组织.
pub type Mask = Array3<bool>;

/// 体数据网格的共用属性和部分通用操作.
pub trait VoxelGridAttr {
    /// 数据形状 `(x, y, z, t)`. 三维数据的 `t` 为 1.
    fn shape4(&self) -> Idx4d;

    /// 体素间距 (毫米), 依次为 x, y, z 方向.
    fn spacing(&self) -> [f64; 3];

    /// 空间部分的形状 `(x, y, z)`.
    #[inline]
    fn shape3(&self) -> Idx3d {
        let (x, y, z, _) = self.shape4();
        (x, y, z)
    }

    /// 水平 (轴向) 切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape4().2
    }

    /// 时间点个数.
    #[inline]
    fn len_t(&self) -> usize {
        self.shape4().3
    }

    /// 是否为三维数据 (单一时间点).
    #[inline]
    fn is_3d(&self) -> bool {
        self.len_t() == 1
    }
}

/// 3D/4D 体数据, 包括体素强度, 体素间距, 重复时间和仿射矩阵.
///
/// 数据与 nifti 一致, 按 `(x, y, z, t)` 组织; 三维数据的 `t` 轴长度为 1.
/// 渲染期间只读, 裁剪等操作总是生成新的对象.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array4<f32>,
    spacing: [f64; 3],
    tr: f64,
    affine: Affine,
}

impl VoxelGridAttr for Volume {
    #[inline]
    fn shape4(&self) -> Idx4d {
        self.data.dim()
    }

    #[inline]
    fn spacing(&self) -> [f64; 3] {
        self.spacing
    }
}

impl Volume {
    /// 由三维数组构建. 仿射矩阵缺省时使用体素间距对角阵.
    pub fn from_array3(data: Array3<f32>, spacing: [f64; 3], affine: Option<Affine>) -> Self {
        Self {
            data: data.insert_axis(Axis(3)),
            spacing,
            tr: 1.0,
            affine: affine.unwrap_or_else(|| Affine::from_spacing(spacing)),
        }
    }

    /// 由四维数组构建. `tr` 为相邻时间点的间隔 (秒).
    pub fn from_array4(
        data: Array4<f32>,
        spacing: [f64; 3],
        tr: f64,
        affine: Option<Affine>,
    ) -> Self {
        Self {
            data,
            spacing,
            tr,
            affine: affine.unwrap_or_else(|| Affine::from_spacing(spacing)),
        }
    }

    /// 打开 nii 文件格式的 3D/4D 体数据. `path` 为本地路径 (`.nii` 或 `.nii.gz`).
    pub fn open<P: AsRef<Path>>(path: P) -> VizResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header().clone();
        let data = obj.into_volume().into_ndarray::<f32>()?;

        let data = match data.ndim() {
            3 => data.insert_axis(Axis(3)),
            4 => data,
            n => {
                return Err(VizError::invalid(format!(
                    "expected a 3D or 4D image, found {n} dimensions in {}",
                    path.as_ref().display()
                )))
            }
        };
        let data = data.into_dimensionality::<Ix4>()?;

        let [_, sx, sy, sz, st, ..] = header.pixdim.map(f64::from);
        let tr = if data.dim().3 > 1 && st > 0.0 { st } else { 1.0 };
        log::debug!(
            "loaded {} with shape {:?}",
            path.as_ref().display(),
            data.dim()
        );

        Ok(Self {
            data,
            spacing: [sx, sy, sz],
            tr,
            affine: Affine::from_header(&header),
        })
    }

    /// 仿射矩阵.
    #[inline]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// 重复时间 (秒).
    #[inline]
    pub fn tr(&self) -> f64 {
        self.tr
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 获得三维数据视图. 若数据不是单一时间点, 返回 `InvalidInput`.
    pub fn view3(&self) -> VizResult<ArrayView3<'_, f32>> {
        if !self.is_3d() {
            return Err(VizError::invalid(format!(
                "expected a 3D image, found {} volumes",
                self.len_t()
            )));
        }
        Ok(self.data.index_axis(Axis(3), 0))
    }

    /// 获取第 `t` 个时间点, 第 `z` 层的水平切片, 按 `(x, y)` 组织.
    ///
    /// 越界时 panic.
    #[inline]
    pub fn axial_at(&self, z: usize, t: usize) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., .., z, t])
    }

    /// 按 `bbox` 裁剪三维数据, 同时平移仿射矩阵原点.
    ///
    /// NaN 替换为 0, 正负无穷替换为 `f32` 的最大/最小有限值.
    pub(crate) fn crop3(&self, bbox: &BoundingBox) -> VizResult<Volume> {
        let view = self.view3()?;
        let [(x0, x1), (y0, y1), (z0, z1)] = bbox.ranges();
        let cropped = view
            .slice(s![x0..x1, y0..y1, z0..z1])
            .mapv(finite_or_clamped);
        Ok(Volume::from_array3(
            cropped,
            self.spacing,
            Some(self.affine.translated_by_voxels(bbox.start())),
        ))
    }
}

/// NaN 取 0, 无穷取同号的最大有限值.
#[inline]
fn finite_or_clamped(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(f32::MIN, f32::MAX)
    }
}

/// 体数据输入: 本地文件路径, 或内存中已有的数据.
///
/// 在 API 入口处一次性解析, 算法内部只接触 [`Volume`].
#[derive(Debug, Clone)]
pub enum VolumeInput {
    /// nifti 文件路径.
    Path(PathBuf),

    /// 已加载的数据.
    Array(Volume),
}

impl VolumeInput {
    /// 解析输入. 文件无法读取时返回 `InvalidInput`.
    pub fn resolve(self) -> VizResult<Volume> {
        match self {
            Self::Array(v) => Ok(v),
            Self::Path(p) => Volume::open(&p).map_err(|e| {
                VizError::invalid(format!("cannot load image {}: {e}", p.display()))
            }),
        }
    }
}

impl From<Volume> for VolumeInput {
    #[inline]
    fn from(value: Volume) -> Self {
        Self::Array(value)
    }
}

impl From<PathBuf> for VolumeInput {
    #[inline]
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for VolumeInput {
    #[inline]
    fn from(value: &Path) -> Self {
        Self::Path(value.to_owned())
    }
}
