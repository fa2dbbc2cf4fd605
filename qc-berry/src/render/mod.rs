//! 渲染后端抽象.
//!
//! 布局算法只通过 [`Renderer`] 与图形后端交互, 因此可以在没有真实后端的情况下测试.
//! crate 自带一个生成 SVG 的后端 [`SvgRenderer`].

use std::path::Path;

use ndarray::ArrayView3;

use crate::data::IntensityBounds;
use crate::error::VizResult;
use crate::PanelImage;

mod colormap;
mod save;
pub(crate) mod svg;

pub use colormap::Colormap;
pub use save::ImgWriteVis;
pub use svg::{escape, SvgRenderer};

/// 切片方向.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// 水平切片, 按 z 切.
    Axial,

    /// 矢状切片, 按 x 切.
    Sagittal,
}

impl DisplayMode {
    /// 坐标标注使用的轴名.
    #[inline]
    pub fn axis_name(&self) -> char {
        match self {
            Self::Axial => 'z',
            Self::Sagittal => 'x',
        }
    }
}

/// 渲染后端的配置. 在构造后端时显式传入.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RendererConfig {
    /// 栅格化分辨率.
    pub dpi: u32,

    /// 每毫米对应的输出单位数.
    pub units_per_mm: f64,

    /// 标签字号.
    pub font_size: f64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            dpi: crate::consts::DEFAULT_DPI,
            units_per_mm: 2.0,
            font_size: 12.0,
        }
    }
}

/// 一行切片的渲染请求.
#[derive(Clone, Debug)]
pub struct CutRowRequest<'a> {
    /// 已裁剪的三维数据, 按 `(x, y, z)` 组织.
    pub volume: ArrayView3<'a, f32>,

    /// 体素间距 (毫米).
    pub spacing: [f64; 3],

    /// 切片方向.
    pub mode: DisplayMode,

    /// 切片的体素索引.
    pub cuts: Vec<usize>,

    /// 切片的物理坐标, 与 `cuts` 一一对应.
    pub coords: Vec<f64>,

    /// 显示窗口.
    pub bounds: IntensityBounds,

    /// 颜色表.
    pub colormap: Colormap,

    /// 叠加显示的分割掩码. 存在时以轮廓形式绘制在强度图之上.
    pub overlay: Option<ArrayView3<'a, bool>>,

    /// 行标题.
    pub title: Option<&'a str>,
}

impl CutRowRequest<'_> {
    /// 是否为叠加模式.
    #[inline]
    pub fn is_overlay(&self) -> bool {
        self.overlay.is_some()
    }
}

/// 文档的排版方式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// 自上而下堆叠.
    Rows,

    /// 按行优先填充网格. 每 `per_cell` 个片段纵向堆叠为一个格子.
    Grid {
        /// 行数.
        rows: usize,
        /// 列数.
        columns: usize,
        /// 每个格子包含的片段数.
        per_cell: usize,
    },
}

/// 已渲染的矢量片段.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    /// 宽度 (输出单位).
    pub width: f64,

    /// 高度 (输出单位).
    pub height: f64,

    /// 后端相关的内容.
    pub body: String,
}

/// 文档类型.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// 完整的 SVG 文档.
    Svg,

    /// 无法绘图时的说明文字.
    Placeholder,
}

/// 最终输出的文档.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    kind: DocumentKind,
    width: f64,
    height: f64,
    content: String,
}

impl Document {
    /// 由 SVG 文本构建.
    #[inline]
    pub fn svg(width: f64, height: f64, content: String) -> Self {
        Self {
            kind: DocumentKind::Svg,
            width,
            height,
            content,
        }
    }

    /// 说明文字占位文档. 用于报告中的图必须存在, 但无法绘制的情况.
    pub fn placeholder(message: &str) -> Self {
        Self {
            kind: DocumentKind::Placeholder,
            width: 0.0,
            height: 0.0,
            content: format!("<p>{}</p>", escape(message)),
        }
    }

    /// 文档类型.
    #[inline]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// 是否为占位文档.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.kind == DocumentKind::Placeholder
    }

    /// 宽度.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// 高度.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// 文档内容.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// 保存到 `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VizResult<()> {
        std::fs::write(path.as_ref(), self.content.as_bytes())?;
        log::debug!("wrote {}", path.as_ref().display());
        Ok(())
    }
}

/// 图形后端的能力接口.
///
/// 后端持有自己的渲染上下文, 因此所有方法都要求 `&mut self`.
/// 并发使用时每个工作线程应当持有独立的实例.
pub trait Renderer {
    /// 渲染一个合成好的面板.
    fn render_panel(&mut self, panel: &PanelImage) -> VizResult<Fragment>;

    /// 渲染一行切片.
    fn render_cut_row(&mut self, request: &CutRowRequest<'_>) -> VizResult<Fragment>;

    /// 把片段按 `layout` 组合成文档.
    fn compose_document(&mut self, fragments: Vec<Fragment>, layout: Layout)
        -> VizResult<Document>;
}
