//! 分布图使用的描述统计: 直方图分箱与高斯核密度估计.

use std::f64::consts::PI;

use ordered_float::NotNan;

use crate::data::window::percentile;
use crate::error::VizResult;

/// 分布图直方图的最大分箱数.
pub const MAX_DIST_BINS: usize = 50;

/// 核密度估计的采样点数.
const KDE_GRID: usize = 100;

/// 核密度曲线向样本两端延伸的带宽倍数.
const KDE_CUT: f64 = 3.0;

/// 升序排列的有限值样本.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sample {
    sorted: Vec<NotNan<f64>>,
}

impl Sample {
    /// 收集 `values` 中的有限值并排序.
    pub fn new<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut sorted: Vec<NotNan<f64>> = values
            .into_iter()
            .filter(|v| v.is_finite())
            .filter_map(|v| NotNan::new(v).ok())
            .collect();
        sorted.sort_unstable();
        Self { sorted }
    }

    /// 样本量.
    #[inline]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// 升序遍历.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.sorted.iter().map(|v| v.into_inner())
    }

    /// 最小值.
    #[inline]
    pub fn min(&self) -> Option<f64> {
        self.sorted.first().map(|v| v.into_inner())
    }

    /// 最大值.
    #[inline]
    pub fn max(&self) -> Option<f64> {
        self.sorted.last().map(|v| v.into_inner())
    }

    /// 第 `p` 百分位数. 样本为空时返回 `EmptyMask`.
    #[inline]
    pub fn percentile(&self, p: f64) -> VizResult<f64> {
        percentile(&self.sorted, p)
    }

    /// 中位数.
    #[inline]
    pub fn median(&self) -> VizResult<f64> {
        self.percentile(50.0)
    }

    /// 均值.
    pub fn mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.iter().sum::<f64>() / self.len() as f64)
    }

    /// 样本标准差 (自由度 n - 1).
    pub fn std(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let ss: f64 = self.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (self.len() - 1) as f64).sqrt())
    }
}

/// Freedman–Diaconis 分箱数, 上限 [`MAX_DIST_BINS`].
///
/// 四分位距为 0 时退化为 `sqrt(n)`.
pub fn freedman_diaconis_bins(sample: &Sample) -> usize {
    let n = sample.len();
    if n < 2 {
        return 1;
    }
    let (Ok(q1), Ok(q3)) = (sample.percentile(25.0), sample.percentile(75.0)) else {
        return 1;
    };
    let h = 2.0 * (q3 - q1) / (n as f64).cbrt();
    let bins = match (sample.min(), sample.max()) {
        (Some(lo), Some(hi)) if h > 0.0 => ((hi - lo) / h).ceil() as usize,
        _ => (n as f64).sqrt() as usize,
    };
    bins.clamp(1, MAX_DIST_BINS)
}

/// 等宽直方图.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
}

impl Histogram {
    /// 在 `[min, max]` 上均分 `bins` 个箱, 最后一个箱为闭区间.
    ///
    /// 样本值全部相同时, 范围扩展为 `[v - 0.5, v + 0.5]`. 样本为空或 `bins == 0` 时返回 `None`.
    pub fn new(sample: &Sample, bins: usize) -> Option<Self> {
        let (mut lo, mut hi) = (sample.min()?, sample.max()?);
        if bins == 0 {
            return None;
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in sample.iter() {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some(Self { edges, counts })
    }

    /// 箱边界, 长度为箱数加一.
    #[inline]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// 每个箱的计数.
    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// 归一化为概率密度.
    pub fn density(&self) -> Vec<f64> {
        let total: usize = self.counts.iter().sum();
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&c, e)| c as f64 / (total as f64 * (e[1] - e[0])))
            .collect()
    }
}

/// 使用 Scott 带宽的高斯核密度估计.
#[derive(Clone, Debug)]
pub struct Kde {
    points: Vec<f64>,
    bandwidth: f64,
}

impl Kde {
    /// 由样本构建. 样本量不足 2 或标准差为 0 时返回 `None`.
    pub fn new(sample: &Sample) -> Option<Self> {
        let std = sample.std()?;
        if std <= 0.0 {
            return None;
        }
        let bandwidth = std * (sample.len() as f64).powf(-0.2);
        Some(Self {
            points: sample.iter().collect(),
            bandwidth,
        })
    }

    /// 带宽.
    #[inline]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// 在 `x` 处的密度.
    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = self.points.len() as f64 * self.bandwidth * (2.0 * PI).sqrt();
        self.points
            .iter()
            .map(|&p| (-0.5 * ((x - p) / self.bandwidth).powi(2)).exp())
            .sum::<f64>()
            / norm
    }

    /// 在样本范围两端各延伸 3 倍带宽的区间上等距采样曲线.
    pub fn curve(&self) -> Vec<(f64, f64)> {
        let lo = self.points.first().copied().unwrap_or_default() - KDE_CUT * self.bandwidth;
        let hi = self.points.last().copied().unwrap_or_default() + KDE_CUT * self.bandwidth;
        let step = (hi - lo) / (KDE_GRID - 1) as f64;
        (0..KDE_GRID)
            .map(|i| lo + step * i as f64)
            .map(|x| (x, self.evaluate(x)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_drops_non_finite() {
        let s = Sample::new([3.0, f64::NAN, 1.0, f64::INFINITY, 2.0]);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert_eq!(s.median().unwrap(), 2.0);
        assert_eq!(s.std(), Some(1.0));
    }

    #[test]
    fn test_freedman_diaconis() {
        let s = Sample::new((0..64).map(f64::from));
        // IQR = 31.5, h = 15.75, 范围 63.
        assert_eq!(freedman_diaconis_bins(&s), 4);

        let flat = Sample::new(std::iter::repeat(1.0).take(16));
        assert_eq!(freedman_diaconis_bins(&flat), 4);

        let wide = Sample::new((0..100).map(|i| if i == 99 { 1e9 } else { f64::from(i % 2) }));
        assert_eq!(freedman_diaconis_bins(&wide), MAX_DIST_BINS);
    }

    #[test]
    fn test_histogram() {
        let s = Sample::new([0.0, 1.0, 2.0, 3.0]);
        let h = Histogram::new(&s, 2).unwrap();
        assert_eq!(h.counts(), &[2, 2]);
        assert_eq!(h.edges(), &[0.0, 1.5, 3.0]);
        let d = h.density();
        assert!((d.iter().sum::<f64>() * 1.5 - 1.0).abs() < 1e-12);

        let flat = Histogram::new(&Sample::new([5.0, 5.0]), 4).unwrap();
        assert_eq!(flat.counts().iter().sum::<usize>(), 2);
        assert!(Histogram::new(&Sample::default(), 4).is_none());
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let s = Sample::new((0..50).map(|i| f64::from(i % 7) * 0.3));
        let kde = Kde::new(&s).unwrap();
        let curve = kde.curve();
        assert_eq!(curve.len(), KDE_GRID);
        let dx = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|&(_, y)| y * dx).sum();
        assert!((area - 1.0).abs() < 0.02);

        assert!(Kde::new(&Sample::new([1.0, 1.0, 1.0])).is_none());
        assert!(Kde::new(&Sample::new([1.0])).is_none());
    }
}
