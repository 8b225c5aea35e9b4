//! 位图画布与视口

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use crate::error::Result;

/// PNG data URI 前缀
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// 页面在指定缩放比例下的视口（单位：像素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    /// 由页面尺寸（PDF 点）和缩放比例计算视口
    pub fn from_points(width_pt: f32, height_pt: f32, scale: f32) -> Self {
        Self {
            width: width_pt * scale,
            height: height_pt * scale,
            scale,
        }
    }

    /// 画布像素尺寸，小数部分截断，至少 1 像素
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = self.width.max(1.0) as u32;
        let h = self.height.max(1.0) as u32;
        (w, h)
    }
}

/// 渲染目标位图
///
/// 每次渲染页面时先按视口调整尺寸（内容清空），再由渲染器写入。
/// OCR 从这里导出 PNG 作为输入。
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// 调整尺寸，原有内容被清空为透明
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    /// 按视口调整尺寸
    pub fn resize_to(&mut self, viewport: &Viewport) {
        let (w, h) = viewport.pixel_size();
        self.resize(w, h);
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// RGBA 原始字节，按行存储
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    /// 用纯色填充整个画布
    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// 把渲染结果贴到画布左上角，超出部分被裁掉
    pub fn draw(&mut self, bitmap: &RgbaImage) {
        if bitmap.dimensions() == self.image.dimensions() {
            self.image.copy_from_slice(bitmap.as_raw());
            return;
        }
        log::debug!(
            "[Render] 位图尺寸 {:?} 与画布 {:?} 不一致，按左上角对齐",
            bitmap.dimensions(),
            self.image.dimensions()
        );
        image::imageops::replace(&mut self.image, bitmap, 0, 0);
    }

    /// 编码为 PNG
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// 导出为 `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> Result<String> {
        let png = self.encode_png()?;
        Ok(format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(png)))
    }

    /// 保存为 PNG 文件
    pub fn save_png(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.encode_png()?)?;
        Ok(())
    }
}
