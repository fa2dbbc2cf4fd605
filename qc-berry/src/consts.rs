//! 通用常量.

/// 矢量图栅格化时的默认分辨率.
pub const DEFAULT_DPI: u32 = 300;

/// DIN A4 横向纸张尺寸 (英寸), 依次为宽和高.
pub const DINA4_LANDSCAPE: (f64, f64) = (11.69, 8.27);

/// 拼图中最多允许的水平切片个数. 超出时按步长减半抽稀.
pub const MAX_AXIAL_CUTS: usize = 36;

/// 拼图默认列数.
pub const DEFAULT_MOSAIC_COLUMNS: usize = 6;

/// 尖峰对比图默认列数.
pub const DEFAULT_SPIKE_COLUMNS: usize = 3;

/// 尖峰个数超过 `列数 * SPIKE_ROWS_PER_COLUMN` 时, 列数自动加一.
pub const SPIKE_ROWS_PER_COLUMN: usize = 7;

/// 逐帧位移计算中, 把转角换算成弧长时默认使用的头部半径 (毫米).
pub const DEFAULT_FD_RADIUS: f64 = 50.0;

/// 频域面板的固定显示窗口.
pub const TRANSFORM_WINDOW: (f64, f64) = (-5.0, 5.0);

/// 轴向裁剪启发式的默认参数.
pub mod trim {
    /// 水平切片数超过该值时才会裁剪.
    pub const AXIAL_TRIM_THRESHOLD: usize = 70;

    /// 上下两端各裁掉的切片数.
    pub const AXIAL_TRIM_MARGIN: usize = 15;
}

/// 强度窗口估计使用的百分位数.
pub mod percentile {
    /// 普通模式下限.
    pub const NORMAL_LOW: f64 = 0.5;

    /// 普通模式上限.
    pub const NORMAL_HIGH: f64 = 99.5;

    /// 噪声模式下限.
    pub const NOISE_LOW: f64 = 0.0;

    /// 噪声模式上限. 该值沿用自旧版报告, 没有文档化的推导过程.
    pub const NOISE_HIGH: f64 = 61.0;
}

/// 常用 RGB 颜色.
pub mod rgb {
    /// 黑色.
    pub const BLACK: [u8; 3] = [0, 0, 0];

    /// 白色.
    pub const WHITE: [u8; 3] = [255, 255, 255];

    /// 轮廓线使用的红色.
    pub const CONTOUR_RED: [u8; 3] = [228, 26, 28];
}
