//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Idx4d};
pub use crate::{VizError, VizResult};

pub use crate::compose::{compose_panel, PanelImage, PanelSpec};
pub use crate::data::{
    Affine, AxialTrim, BoundingBox, BoundsOverride, IntensityBounds, Mask, Volume, VolumeInput,
    VoxelGridAttr, WindowMode,
};
pub use crate::render::{
    Colormap, Document, ImgWriteVis, Layout, Renderer, RendererConfig, SvgRenderer,
};

pub use crate::mosaic::{render_mosaic, BboxSource, MosaicOptions};
pub use crate::motion::{compute_fd, compute_fd_from_path, FdSeries, MotionParameters};
pub use crate::spikes::{render_spikes, SpikeCoordinate, SpikeOptions};

pub use crate::consts::{DEFAULT_DPI, DEFAULT_FD_RADIUS};
pub use crate::dataset::{self, home_dataset_dir_with};
