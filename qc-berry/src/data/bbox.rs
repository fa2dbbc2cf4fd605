//! 拼图裁剪使用的包围盒.

use crate::consts::trim::{AXIAL_TRIM_MARGIN, AXIAL_TRIM_THRESHOLD};
use crate::error::{VizError, VizResult};
use crate::Idx3d;

use super::Mask;

/// 三个轴上的左闭右开体素索引区间, 依次为 x, y, z.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    ranges: [(usize, usize); 3],
}

/// 轴向裁剪启发式: 水平切片数超过 `threshold` 时, 两端各去掉 `margin` 层.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AxialTrim {
    /// 触发裁剪的切片数阈值 (严格大于).
    pub threshold: usize,

    /// 每端裁掉的切片数.
    pub margin: usize,
}

impl Default for AxialTrim {
    fn default() -> Self {
        Self {
            threshold: AXIAL_TRIM_THRESHOLD,
            margin: AXIAL_TRIM_MARGIN,
        }
    }
}

impl BoundingBox {
    /// 直接构建.
    #[inline]
    pub const fn new(ranges: [(usize, usize); 3]) -> Self {
        Self { ranges }
    }

    /// 覆盖整个 `shape` 的包围盒.
    #[inline]
    pub const fn full((x, y, z): Idx3d) -> Self {
        Self::new([(0, x), (0, y), (0, z)])
    }

    /// 掩码中非零区域的最小包围盒. 掩码全空时返回 `None`.
    pub fn from_mask(mask: &Mask) -> Option<Self> {
        let mut lo = [usize::MAX; 3];
        let mut hi = [0usize; 3];
        let mut any = false;
        for ((x, y, z), _) in mask.indexed_iter().filter(|&(_, &m)| m) {
            any = true;
            for (axis, v) in [x, y, z].into_iter().enumerate() {
                lo[axis] = lo[axis].min(v);
                hi[axis] = hi[axis].max(v + 1);
            }
        }
        any.then(|| Self::new([(lo[0], hi[0]), (lo[1], hi[1]), (lo[2], hi[2])]))
    }

    /// 没有显式包围盒时的默认值: 轴向过长则两端对称裁剪, 否则覆盖全图.
    pub fn heuristic(shape: Idx3d, trim: &AxialTrim) -> Self {
        let mut bbox = Self::full(shape);
        let z = shape.2;
        if z > trim.threshold && z > 2 * trim.margin {
            bbox.ranges[2] = (trim.margin, z - trim.margin);
        }
        bbox
    }

    /// 各轴区间.
    #[inline]
    pub fn ranges(&self) -> [(usize, usize); 3] {
        self.ranges
    }

    /// 起始索引.
    #[inline]
    pub fn start(&self) -> Idx3d {
        let [(x, _), (y, _), (z, _)] = self.ranges;
        (x, y, z)
    }

    /// 裁剪后的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let [(x0, x1), (y0, y1), (z0, z1)] = self.ranges;
        (x1 - x0, y1 - y0, z1 - z0)
    }

    /// 检查包围盒是否位于 `shape` 之内且非空.
    pub fn validate(&self, (x, y, z): Idx3d) -> VizResult<()> {
        for ((start, end), len) in self.ranges.iter().zip([x, y, z]) {
            if start >= end || *end > len {
                return Err(VizError::invalid(format!(
                    "bounding box {:?} does not fit volume of shape {:?}",
                    self.ranges,
                    (x, y, z)
                )));
            }
        }
        Ok(())
    }
}
