//! 逐帧位移 (framewise displacement, FD).
//!
//! 输入为每个时间点一行的 6 参数刚体运动估计: 3 个平移 (毫米) 和 3 个转角 (度).
//! 转角通过头部半径换算成弧长, 与平移分量的绝对差一起累加.

use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;

use crate::error::{VizError, VizResult};

/// 每个时间点的运动参数个数.
pub const MOTION_FIELDS: usize = 6;

/// 6 参数运动估计序列.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionParameters {
    rows: Vec<[f64; MOTION_FIELDS]>,
}

impl MotionParameters {
    /// 直接构建.
    #[inline]
    pub fn new(rows: Vec<[f64; MOTION_FIELDS]>) -> Self {
        Self { rows }
    }

    /// 解析空白分隔的文本. 空行被跳过.
    ///
    /// 某行字段数不是 6 或含有非数字字段时, 返回带行号 (从 1 开始) 的 `MalformedInput`;
    /// 没有任何数据行时同样返回 `MalformedInput`.
    pub fn parse(text: &str) -> VizResult<Self> {
        let mut rows = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != MOTION_FIELDS {
                return Err(VizError::malformed_at(
                    i + 1,
                    format!("expected {MOTION_FIELDS} fields, found {}", fields.len()),
                ));
            }
            let mut row = [0.0; MOTION_FIELDS];
            for (slot, field) in row.iter_mut().zip(fields) {
                *slot = field
                    .parse()
                    .map_err(|_| VizError::malformed_at(i + 1, format!("not a number: `{field}`")))?;
            }
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(VizError::malformed("motion parameters contain no rows"));
        }
        Ok(Self { rows })
    }

    /// 读取并解析运动参数文件.
    pub fn open<P: AsRef<Path>>(path: P) -> VizResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// 时间点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 所有行.
    #[inline]
    pub fn rows(&self) -> &[[f64; MOTION_FIELDS]] {
        &self.rows
    }
}

impl FromStr for MotionParameters {
    type Err = VizError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// FD 序列, 每个时间点一个非负值, 首个值恒为 0.
#[derive(Clone, Debug, PartialEq)]
pub struct FdSeries(Vec<f64>);

impl FdSeries {
    /// 所有值.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// 时间点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 均值. 序列为空时为 NaN.
    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / self.0.len() as f64
    }

    /// 最大值. 序列为空时为 NaN.
    pub fn max(&self) -> f64 {
        self.0.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
    }

    /// 取出内部向量.
    #[inline]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// 计算 FD 序列.
///
/// `FD[i] = Σ|Δ平移| + radius · π / 180 · Σ|Δ转角|`, 其中 `i >= 1`; `FD[0] = 0`.
/// 输出长度与输入相同.
pub fn compute_fd(params: &MotionParameters, radius: f64) -> FdSeries {
    if params.rows.is_empty() {
        return FdSeries(Vec::new());
    }
    let arc = radius.to_radians();
    let rest = params.rows.iter().tuple_windows().map(|(prev, cur)| {
        let delta = |i: usize| (cur[i] - prev[i]).abs();
        (0..3).map(delta).sum::<f64>() + arc * (3..6).map(delta).sum::<f64>()
    });
    FdSeries(std::iter::once(0.0).chain(rest).collect())
}

/// 读取运动参数文件并计算 FD 序列.
pub fn compute_fd_from_path<P: AsRef<Path>>(path: P, radius: f64) -> VizResult<FdSeries> {
    let params = MotionParameters::open(path)?;
    Ok(compute_fd(&params, radius))
}

/// 一组 FD 序列的 (均值, 最大值) 汇总.
pub fn summary_stats<'a, I>(series: I) -> (Vec<f64>, Vec<f64>)
where
    I: IntoIterator<Item = &'a FdSeries>,
{
    series.into_iter().map(|s| (s.mean(), s.max())).unzip()
}

/// 读取一组运动参数文件, 返回每个受试者 FD 的 (均值, 最大值).
///
/// 任一文件出错时返回该错误.
pub fn mean_fd_distribution<P: AsRef<Path>>(paths: &[P], radius: f64) -> VizResult<(Vec<f64>, Vec<f64>)> {
    let series = paths
        .iter()
        .map(|p| compute_fd_from_path(p, radius))
        .collect::<VizResult<Vec<_>>>()?;
    log::debug!("summarised FD of {} subjects", series.len());
    Ok(summary_stats(&series))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        /// [`mean_fd_distribution`] 的并行版本, 输出顺序与 `paths` 一致.
        pub fn par_mean_fd_distribution<P>(paths: &[P], radius: f64) -> VizResult<(Vec<f64>, Vec<f64>)>
        where
            P: AsRef<Path> + Sync,
        {
            let series = paths
                .par_iter()
                .map(|p| compute_fd_from_path(p, radius))
                .collect::<VizResult<Vec<_>>>()?;
            Ok(summary_stats(&series))
        }
    }
}
