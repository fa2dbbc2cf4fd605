//! 运行时错误.

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// 渲染与统计过程中的错误.
///
/// 除 `MalformedInput` 在背景噪声拟合图中会被降级处理外,
/// 其余错误都原样返回给调用方, 由上层按受试者隔离.
#[derive(Error, Debug)]
pub enum VizError {
    /// 缺失或不受支持的体数据, 形状不符的掩码, 不合理的布局参数等.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 百分位数统计时, 掩码没有选中任何体素.
    #[error("percentile requested over an empty mask")]
    EmptyMask,

    /// 文本或 JSON 输入格式错误.
    #[error("malformed input{}: {reason}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    MalformedInput {
        /// 出错的行号 (从 1 开始). 不适用时为 `None`.
        line: Option<usize>,
        /// 具体原因.
        reason: String,
    },

    /// 数组拼接或变形失败, 例如相邻切片形状不一致.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(#[from] ndarray::ShapeError),

    /// nifti 文件读取错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 底层 I/O 错误.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG 导出错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 统计图绘制错误.
    #[error("plot error: {0}")]
    Plot(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for VizError
where
    E: std::error::Error + Send + Sync,
{
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Self::Plot(e.to_string())
    }
}

impl VizError {
    /// 构造 `InvalidInput`.
    #[inline]
    pub(crate) fn invalid<S: Into<String>>(reason: S) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// 构造带行号的 `MalformedInput`.
    #[inline]
    pub(crate) fn malformed_at<S: Into<String>>(line: usize, reason: S) -> Self {
        Self::MalformedInput {
            line: Some(line),
            reason: reason.into(),
        }
    }

    /// 构造不带行号的 `MalformedInput`.
    #[inline]
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        Self::MalformedInput {
            line: None,
            reason: reason.into(),
        }
    }
}

/// 本 crate 的通用返回类型.
pub type VizResult<T> = Result<T, VizError>;
