//! 绘制表面尺寸管理
//!
//! 后备缓冲尺寸 = 逻辑尺寸 × 设备像素比。相同输入得到相同结果，
//! 重复调用只会返回 `Unchanged`。

use glam::Vec2;

/// 后备像素缓冲尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackingSize {
    /// 物理宽度（像素）
    pub width: u32,
    /// 物理高度（像素）
    pub height: u32,
    /// 设备像素比
    pub scale_factor: f64,
}

impl BackingSize {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            scale_factor,
        }
    }

    /// 场空间到裁剪空间的缩放，保证圆盘在非正方形表面上仍然是圆的
    pub fn aspect_scale(&self) -> Vec2 {
        let w = self.width as f32;
        let h = self.height as f32;
        Vec2::new((h / w).min(1.0), (w / h).min(1.0))
    }

    /// 将 NDC 坐标转换到场空间
    pub fn ndc_to_field(&self, ndc: Vec2) -> Vec2 {
        ndc / self.aspect_scale()
    }

    /// 每个逻辑像素对应的裁剪空间长度
    pub fn logical_pixel_to_clip(&self) -> Vec2 {
        let s = self.scale_factor as f32;
        Vec2::new(2.0 * s / self.width as f32, 2.0 * s / self.height as f32)
    }
}

/// 尺寸变化结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceChange {
    /// 尺寸与上次相同
    Unchanged(BackingSize),
    /// 尺寸变化，需要重新配置表面和视口
    Resized(BackingSize),
}

impl SurfaceChange {
    pub fn size(&self) -> BackingSize {
        match *self {
            Self::Unchanged(size) | Self::Resized(size) => size,
        }
    }
}

/// 表面尺寸管理器
#[derive(Debug, Clone)]
pub struct SurfaceManager {
    current: Option<BackingSize>,
    max_dimension: u32,
}

impl SurfaceManager {
    /// 创建管理器，`max_dimension` 一般取设备的 `max_texture_dimension_2d`
    pub fn new(max_dimension: u32) -> Self {
        Self {
            current: None,
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn current(&self) -> Option<BackingSize> {
        self.current
    }

    pub fn set_max_dimension(&mut self, max_dimension: u32) {
        self.max_dimension = max_dimension.max(1);
    }

    /// 计算后备缓冲尺寸（不修改状态）
    pub fn backing_size(&self, logical: (f64, f64), device_pixel_ratio: f64) -> BackingSize {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let to_pixels = |v: f64| {
            let px = (v.max(0.0) * dpr).round();
            (px as u32).clamp(1, self.max_dimension)
        };
        BackingSize::new(to_pixels(logical.0), to_pixels(logical.1), dpr)
    }

    /// 应用新的逻辑尺寸与设备像素比
    pub fn apply(&mut self, logical: (f64, f64), device_pixel_ratio: f64) -> SurfaceChange {
        let size = self.backing_size(logical, device_pixel_ratio);
        if self.current == Some(size) {
            return SurfaceChange::Unchanged(size);
        }
        tracing::debug!(
            target: "render",
            "Surface backing size {}x{} (dpr {:.2})",
            size.width,
            size.height,
            size.scale_factor
        );
        self.current = Some(size);
        SurfaceChange::Resized(size)
    }
}

impl Default for SurfaceManager {
    fn default() -> Self {
        Self::new(8192)
    }
}
