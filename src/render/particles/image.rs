//! 已解码的源图像像素
//!
//! 核心只消费解码后的 RGBA8 数据；文件解码由宿主在工作线程中调用 [`ImagePixels::load`] 完成。

use glam::Vec2;
use std::path::Path;

use crate::core::error::{AssetError, AssetResult};

/// 可见性阈值：alpha 严格大于该值的像素才会生成粒子
pub const ALPHA_THRESHOLD: u8 = 128;

/// RGBA8 像素缓冲
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePixels {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl ImagePixels {
    /// 创建像素缓冲，长度必须为 `width * height * 4`
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> AssetResult<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AssetError::InvalidPixels {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// 从 `image` crate 的 RGBA 图像构造
    pub fn from_rgba_image(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            rgba: image.into_raw(),
        }
    }

    /// 读取并解码图像文件
    pub fn load<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|e| AssetError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_rgba_image(decoded.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 像素 alpha 值，越界返回 `None`
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4 + 3;
        self.rgba.get(idx).copied()
    }

    /// 像素 RGB（0-1）
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(idx..idx + 3)?;
        Some([px[0] as f32 / 255.0, px[1] as f32 / 255.0, px[2] as f32 / 255.0])
    }

    /// 像素中心映射到场空间
    ///
    /// 保持宽高比，长轴覆盖 `[-scale, scale]`，y 轴翻转为向上。
    pub fn to_field(&self, x: u32, y: u32, scale: f32) -> Vec2 {
        let w = self.width as f32;
        let h = self.height as f32;
        let half_long = w.max(h).max(1.0) * 0.5;
        let cx = x as f32 + 0.5 - w * 0.5;
        let cy = y as f32 + 0.5 - h * 0.5;
        Vec2::new(cx / half_long * scale, -cy / half_long * scale)
    }

    /// 按步长遍历网格，返回 alpha 超过阈值的像素坐标
    pub fn visible_cells(&self, stride: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let stride = stride.max(1) as usize;
        (0..self.height).step_by(stride).flat_map(move |y| {
            (0..self.width).step_by(stride).filter_map(move |x| {
                match self.alpha_at(x, y) {
                    Some(a) if a > ALPHA_THRESHOLD => Some((x, y)),
                    _ => None,
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, alpha: u8) -> ImagePixels {
        let rgba = [255, 255, 255, alpha].repeat((width * height) as usize);
        ImagePixels::new(width, height, rgba).unwrap()
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = ImagePixels::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            AssetError::InvalidPixels {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(solid(4, 4, ALPHA_THRESHOLD).visible_cells(1).count(), 0);
        assert_eq!(solid(4, 4, ALPHA_THRESHOLD + 1).visible_cells(1).count(), 16);
    }

    #[test]
    fn test_field_mapping_preserves_aspect() {
        let img = solid(200, 100, 255);
        let top_left = img.to_field(0, 0, 1.0);
        let bottom_right = img.to_field(199, 99, 1.0);
        assert!(top_left.x < -0.98 && top_left.y > 0.48 && top_left.y < 0.5);
        assert!(bottom_right.x > 0.98 && bottom_right.y < -0.48);
    }

    #[test]
    fn test_from_rgba_image() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 200]));
        let pixels = ImagePixels::from_rgba_image(img);
        assert_eq!((pixels.width(), pixels.height()), (3, 2));
        assert_eq!(pixels.alpha_at(2, 1), Some(200));
        assert_eq!(pixels.alpha_at(3, 1), None);
        let rgb = pixels.rgb_at(0, 0).unwrap();
        assert!((rgb[1] - 20.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = ImagePixels::load("definitely/not/here.png").unwrap_err();
        match err {
            AssetError::LoadFailed { path, .. } => assert!(path.ends_with("here.png")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
