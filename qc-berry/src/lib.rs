#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 为脑影像质量控制流程生成可供人工审阅的可视化结果, 并计算头动质量指标.
//!
//! 该 crate 只提供 `safe` 接口. 所有操作都是 (数组, 参数) 到 (渲染结果, 派生值) 的纯函数,
//! 不存在跨调用的全局状态.
//!
//! # 注意
//!
//! 1. 体数据按 nifti 的 `(x, y, z, t)` 顺序组织, 三维数据的 `t` 轴长度为 1.
//! 2. 图形后端通过 [`render::Renderer`] 注入. crate 自带的 [`render::SvgRenderer`]
//!   只依赖标准库写出 SVG 文本, 面板也可以借助 `image` 导出为 PNG.
//! 3. 错误通过 [`VizError`] 返回, 调用方 (例如批处理程序) 负责按受试者隔离.
//!
//! # 开发计划
//!
//! ### 强度显示窗口 ✅
//!
//! 基于百分位数的稳健窗口估计, 支持噪声模式和分量级覆盖.
//!
//! 实现位于 `qc-berry/src/data/window.rs`.
//!
//! ### 相邻切片对比面板 ✅
//!
//! `[前一帧 | 目标 | 后一帧]` 三联面板, 原点位于左下角.
//!
//! 实现位于 `qc-berry/src/compose.rs`.
//!
//! ### 切片拼图 ✅
//!
//! 包围盒裁剪, 轴向切片抽稀, 按行排版, 以及可选的矢状补充行和分割叠加模式.
//!
//! 实现位于 `qc-berry/src/mosaic.rs`.
//!
//! ### 逐帧位移 (FD) ✅
//!
//! 6 参数刚体运动估计到逐帧位移序列, 以及组水平的均值分布.
//!
//! 实现位于 `qc-berry/src/motion.rs`.
//!
//! ### 尖峰对比网格 ✅
//!
//! 实现位于 `qc-berry/src/spikes.rs`.
//!
//! ### 报告附图 ✅
//!
//! FD 曲线, 数值分布, 背景噪声拟合 (以上由 `plotters` 绘制), 分割轮廓.
//!
//! 实现位于 `qc-berry/src/figures`.
//!
//! ### 栅格化后端 ⌛️
//!
//! 目前 SVG 需要外部工具转换为位图. 直接输出 PDF 的后端尚未开始.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 四维索引, 依次为 `(x, y, z, t)`.
pub type Idx4d = (usize, usize, usize, usize);

pub mod consts;

mod error;
pub use error::{VizError, VizResult};

/// 3D/4D 体数据及其派生结构.
pub mod data;

mod compose;
pub use compose::{compose_panel, PanelImage, PanelSpec};

pub mod render;

pub mod mosaic;

pub mod motion;

pub mod spikes;

pub mod figures;

pub mod dataset;
pub mod prelude;
