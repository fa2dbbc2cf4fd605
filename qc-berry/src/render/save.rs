//! 面板的栅格化持久存储.

use std::path::Path;

use image::{ImageResult, Rgb, RgbImage};

use crate::PanelImage;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 面板在合成时已经应用了颜色表与显示窗口, 因此保存时按原样写出 RGB 像素.
pub trait ImgWriteVis {
    /// 把图片保存到 `path` 路径. 格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;

    /// 转换为内存中的 RGB 图像.
    fn to_rgb_image(&self) -> RgbImage;
}

impl ImgWriteVis for PanelImage {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.to_rgb_image().save(path)
    }

    fn to_rgb_image(&self) -> RgbImage {
        let (height, width) = self.shape();
        let pixels = self.pixels();
        let mut buf = RgbImage::new(width as u32, height as u32);
        for (x, y, pix) in buf.enumerate_pixels_mut() {
            let (r, c) = (y as usize, x as usize);
            *pix = Rgb([pixels[(r, c, 0)], pixels[(r, c, 1)], pixels[(r, c, 2)]]);
        }
        buf
    }
}
