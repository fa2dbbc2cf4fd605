//! 强度显示窗口.

use ordered_float::NotNan;

use crate::consts::percentile::*;
use crate::error::{VizError, VizResult};

/// 估计显示窗口的模式.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WindowMode {
    /// 使用全部非 NaN 体素.
    #[default]
    Normal,

    /// 额外排除值恰为 0 的体素, 并压低上限以突出背景噪声.
    Noise,
}

/// 两种模式下使用的百分位数 (0 ~ 100).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WindowPercentiles {
    /// 普通模式的 (下限, 上限).
    pub normal: (f64, f64),

    /// 噪声模式的 (下限, 上限).
    pub noise: (f64, f64),
}

impl Default for WindowPercentiles {
    fn default() -> Self {
        Self {
            normal: (NORMAL_LOW, NORMAL_HIGH),
            noise: (NOISE_LOW, NOISE_HIGH),
        }
    }
}

impl WindowPercentiles {
    #[inline]
    fn of(&self, mode: WindowMode) -> (f64, f64) {
        match mode {
            WindowMode::Normal => self.normal,
            WindowMode::Noise => self.noise,
        }
    }
}

/// 强度显示窗口 `(vmin, vmax)`, 保证 `vmin <= vmax`.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct IntensityBounds {
    vmin: f64,
    vmax: f64,
}

impl IntensityBounds {
    /// 构建窗口.
    ///
    /// 任一端不是有限值, 或 `vmin > vmax` 时返回 `None`.
    pub fn new(vmin: f64, vmax: f64) -> Option<Self> {
        (vmin.is_finite() && vmax.is_finite() && vmin <= vmax).then_some(Self { vmin, vmax })
    }

    /// 频域面板使用的固定窗口 `[-5, 5]`.
    #[inline]
    pub const fn transform() -> Self {
        let (vmin, vmax) = crate::consts::TRANSFORM_WINDOW;
        Self { vmin, vmax }
    }

    /// 窗下限.
    #[inline]
    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    /// 窗上限.
    #[inline]
    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    /// 用默认百分位数从 `values` 估计窗口.
    #[inline]
    pub fn estimate<'a, I>(values: I, mode: WindowMode) -> VizResult<Self>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        Self::estimate_with(values, mode, &WindowPercentiles::default())
    }

    /// 从 `values` 的非 NaN 部分估计窗口.
    ///
    /// 掩码为空时返回 `EmptyMask`.
    pub fn estimate_with<'a, I>(values: I, mode: WindowMode, pct: &WindowPercentiles) -> VizResult<Self>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        let keep_zero = mode == WindowMode::Normal;
        let mut sorted: Vec<NotNan<f64>> = values
            .into_iter()
            .filter(|&&v| keep_zero || v != 0.0)
            .filter_map(|&v| NotNan::new(f64::from(v)).ok())
            .collect();
        sorted.sort_unstable();

        let (lo, hi) = pct.of(mode);
        let vmin = percentile(&sorted, lo)?;
        let vmax = percentile(&sorted, hi)?;
        Ok(Self { vmin, vmax })
    }

    /// 求 `v` 在当前窗口下的归一化位置 (0.0 <= value <= 1.0), 窗外的值截断到两端.
    ///
    /// 如果 `v` 为 NaN, 则返回 `None`. 窗宽为 0 时总是返回 0.
    pub fn normalize(&self, v: f64) -> Option<f64> {
        if v.is_nan() {
            return None;
        }
        let width = self.vmax - self.vmin;
        if width <= 0.0 {
            return Some(0.0);
        }
        Some(((v - self.vmin) / width).clamp(0.0, 1.0))
    }
}

/// 调用方对窗口的覆盖. 只有未设置的一端才会被估计.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BoundsOverride {
    /// 覆盖下限.
    pub vmin: Option<f64>,

    /// 覆盖上限.
    pub vmax: Option<f64>,
}

impl BoundsOverride {
    /// 不覆盖任何一端.
    #[inline]
    pub const fn none() -> Self {
        Self {
            vmin: None,
            vmax: None,
        }
    }

    /// 两端都固定.
    #[inline]
    pub const fn fixed(bounds: IntensityBounds) -> Self {
        Self {
            vmin: Some(bounds.vmin),
            vmax: Some(bounds.vmax),
        }
    }

    /// 用默认百分位数解析窗口.
    #[inline]
    pub fn resolve<'a, I>(&self, values: I, mode: WindowMode) -> VizResult<IntensityBounds>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        self.resolve_with(values, mode, &WindowPercentiles::default())
    }

    /// 解析窗口: 给定的一端直接使用, 缺失的一端从 `values` 估计.
    ///
    /// 两端都给定时不会遍历 `values`. 最终 `vmin > vmax` 时返回 `InvalidInput`.
    pub fn resolve_with<'a, I>(
        &self,
        values: I,
        mode: WindowMode,
        pct: &WindowPercentiles,
    ) -> VizResult<IntensityBounds>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        let (vmin, vmax) = match (self.vmin, self.vmax) {
            (Some(lo), Some(hi)) => (lo, hi),
            (lo, hi) => {
                let est = IntensityBounds::estimate_with(values, mode, pct)?;
                (lo.unwrap_or(est.vmin), hi.unwrap_or(est.vmax))
            }
        };
        IntensityBounds::new(vmin, vmax).ok_or_else(|| {
            VizError::invalid(format!("invalid intensity window [{vmin}, {vmax}]"))
        })
    }
}

/// 对升序数组求第 `p` 百分位数, 在相邻秩之间线性插值.
pub(crate) fn percentile(sorted: &[NotNan<f64>], p: f64) -> VizResult<f64> {
    let n = sorted.len();
    if n == 0 {
        return Err(VizError::EmptyMask);
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let (a, b) = (sorted[lo].into_inner(), sorted[hi].into_inner());
    Ok(a + (b - a) * (rank - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|v| v as f32).collect()
    }

    #[test]
    fn test_normal_mode_percentiles() {
        // 0..=200, 0.5% 与 99.5% 分别落在 1 与 199.
        let data = ramp(201);
        let b = IntensityBounds::estimate(&data, WindowMode::Normal).unwrap();
        assert!(float_eq(b.vmin(), 1.0));
        assert!(float_eq(b.vmax(), 199.0));
        assert!(b.vmin() <= b.vmax());
    }

    #[test]
    fn test_nan_is_masked_out() {
        let mut data = ramp(101);
        data.push(f32::NAN);
        data.push(f32::NAN);
        let b = IntensityBounds::estimate(&data, WindowMode::Noise).unwrap();
        // 噪声模式排除 0, 剩余 1..=100.
        assert!(float_eq(b.vmin(), 1.0));
        assert!(float_eq(b.vmax(), 1.0 + 0.61 * 99.0));
    }

    #[test]
    fn test_empty_mask() {
        let data = [f32::NAN, f32::NAN];
        assert!(matches!(
            IntensityBounds::estimate(&data, WindowMode::Normal),
            Err(VizError::EmptyMask)
        ));
        let zeros = [0.0f32; 8];
        assert!(matches!(
            IntensityBounds::estimate(&zeros, WindowMode::Noise),
            Err(VizError::EmptyMask)
        ));
    }

    #[test]
    fn test_partial_override() {
        let data = ramp(201);
        let only_max = BoundsOverride {
            vmin: None,
            vmax: Some(150.0),
        };
        let b = only_max.resolve(&data, WindowMode::Normal).unwrap();
        assert!(float_eq(b.vmin(), 1.0));
        assert!(float_eq(b.vmax(), 150.0));

        let only_min = BoundsOverride {
            vmin: Some(0.0),
            vmax: None,
        };
        let b = only_min.resolve(&data, WindowMode::Normal).unwrap();
        assert!(float_eq(b.vmin(), 0.0));
        assert!(float_eq(b.vmax(), 199.0));
    }

    #[test]
    fn test_complete_override_skips_estimation() {
        let empty: [f32; 0] = [];
        let fixed = BoundsOverride::fixed(IntensityBounds::transform());
        let b = fixed.resolve(&empty, WindowMode::Normal).unwrap();
        assert_eq!(b, IntensityBounds::transform());
    }

    #[test]
    fn test_inverted_override_is_rejected() {
        let data = ramp(10);
        let bad = BoundsOverride {
            vmin: Some(100.0),
            vmax: None,
        };
        assert!(matches!(
            bad.resolve(&data, WindowMode::Normal),
            Err(VizError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_normalize() {
        let b = IntensityBounds::new(10.0, 20.0).unwrap();
        assert_eq!(b.normalize(f64::NAN), None);
        assert_eq!(b.normalize(0.0), Some(0.0));
        assert_eq!(b.normalize(15.0), Some(0.5));
        assert_eq!(b.normalize(99.0), Some(1.0));

        let flat = IntensityBounds::new(3.0, 3.0).unwrap();
        assert_eq!(flat.normalize(7.0), Some(0.0));
        assert!(IntensityBounds::new(2.0, 1.0).is_none());
    }
}
