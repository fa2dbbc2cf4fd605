//! 体素索引到物理坐标的仿射变换.

use nifti::NiftiHeader;

use crate::Idx3d;

/// 4x4 仿射矩阵, 把体素索引 `(i, j, k)` 映射到物理坐标 (毫米).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Affine([[f64; 4]; 4]);

impl Default for Affine {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    /// 直接由矩阵构造.
    #[inline]
    pub const fn new(m: [[f64; 4]; 4]) -> Self {
        Self(m)
    }

    /// 单位变换.
    pub const fn identity() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// 以体素间距为对角线, 原点为 0 的变换.
    pub fn from_spacing([sx, sy, sz]: [f64; 3]) -> Self {
        Self([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// 从 nifti header 中恢复仿射矩阵.
    ///
    /// 优先使用 sform, 其次使用 qform 四元数, 都缺失时退化为体素间距对角阵.
    pub fn from_header(h: &NiftiHeader) -> Self {
        if h.sform_code > 0 {
            let row = |r: &[f32; 4]| r.map(f64::from);
            return Self([
                row(&h.srow_x),
                row(&h.srow_y),
                row(&h.srow_z),
                [0.0, 0.0, 0.0, 1.0],
            ]);
        }

        let [qfac, sx, sy, sz, ..] = h.pixdim.map(f64::from);
        if h.qform_code <= 0 {
            return Self::from_spacing([sx, sy, sz]);
        }

        let (b, c, d) = (
            f64::from(h.quatern_b),
            f64::from(h.quatern_c),
            f64::from(h.quatern_d),
        );
        let a = (1.0 - b * b - c * c - d * d).max(0.0).sqrt();
        let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };
        let r = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c - a * d),
                2.0 * (b * d + a * c),
            ],
            [
                2.0 * (b * c + a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d - a * b),
            ],
            [
                2.0 * (b * d - a * c),
                2.0 * (c * d + a * b),
                a * a + d * d - b * b - c * c,
            ],
        ];
        let offset = [
            f64::from(h.quatern_x),
            f64::from(h.quatern_y),
            f64::from(h.quatern_z),
        ];
        let scale = [sx, sy, sz * qfac];

        let mut m = Self::identity().0;
        for (i, row) in r.iter().enumerate() {
            for j in 0..3 {
                m[i][j] = row[j] * scale[j];
            }
            m[i][3] = offset[i];
        }
        Self(m)
    }

    /// 对齐次坐标 `[i, j, k, 1]` 作用, 返回物理坐标.
    pub fn apply(&self, [i, j, k]: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [0, 1, 2].map(|r| m[r][0] * i + m[r][1] * j + m[r][2] * k + m[r][3])
    }

    /// 把原点平移 `affine[:3, :3] · start`, 使裁剪后体数据的物理坐标保持不变.
    pub fn translated_by_voxels(&self, (i, j, k): Idx3d) -> Self {
        let mut m = self.0;
        let start = [i as f64, j as f64, k as f64];
        for row in m.iter_mut().take(3) {
            row[3] += row[0] * start[0] + row[1] * start[1] + row[2] * start[2];
        }
        Self(m)
    }

    /// 每个体素轴方向上的物理步长 (列向量的模).
    pub fn zooms(&self) -> [f64; 3] {
        let m = &self.0;
        [0, 1, 2].map(|c| (0..3).map(|r| m[r][c].powi(2)).sum::<f64>().sqrt())
    }
}
