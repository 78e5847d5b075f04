use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 单个会话允许的最大粒子数
pub const MAX_PARTICLES: u32 = 1_000_000;

/// 粒子分布策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// 圆盘内均匀分布
    Uniform,
    /// 均匀角度 + 平方根半径律的圆盘分布
    DiscDensityCorrected,
    /// 从源图像 alpha 通道按步长采样
    ImageSampled,
}

impl Default for DistributionKind {
    fn default() -> Self {
        Self::DiscDensityCorrected
    }
}

/// 粒子场配置
///
/// 在一个渲染会话内不可变；新的配置会导致完整的重新初始化
/// （重新生成粒子、重建着色器管线）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// 粒子颜色（6 位十六进制，可带 `#` 前缀）
    pub color: String,
    /// 调色板；非空时每个粒子随机选取其中一种颜色
    pub color_palette: Vec<String>,
    /// 非图像分布的粒子数量
    pub particle_count: u32,
    /// 基础点直径（逻辑像素）
    pub point_size: f32,
    /// 指针排斥的衰减半径（场空间单位）
    pub interaction_radius: f32,
    /// 分布策略
    pub distribution: DistributionKind,
    /// 图像采样模式的源图像路径
    pub source_image: Option<PathBuf>,
    /// 图像采样步长（像素）
    pub sampling_stride: u32,
    /// 是否启用光晕通道
    pub glow_enabled: bool,
    /// 最大位移（场空间单位）
    pub displacement_strength: f32,
    /// 指针平滑系数 α
    pub smoothing_factor: f32,
    /// 圆盘分布半径（场空间单位）
    pub disc_radius: f32,
    /// 相对尺寸抖动
    pub size_jitter: f32,
    /// 图像长轴的半宽（场空间单位）
    pub image_scale: f32,
    /// 图像采样模式是否响应指针
    pub image_interaction: bool,
    /// 图像采样模式下粒子是否使用源像素颜色
    pub use_image_colors: bool,
    /// 图像模式闲置动画速度（弧度/秒）
    pub pulse_speed: f32,
    /// 图像模式闲置动画幅度
    pub pulse_amount: f32,
    /// 指针从表面外进入时，平滑值是否直接跳到目标
    pub snap_on_enter: bool,
}

impl_default!(FieldConfig {
    color: "#ffffff".to_string(),
    color_palette: Vec::new(),
    particle_count: 1000,
    point_size: 2.0,
    interaction_radius: 0.4,
    distribution: DistributionKind::default(),
    source_image: None,
    sampling_stride: 4,
    glow_enabled: false,
    displacement_strength: 0.1,
    smoothing_factor: 0.08,
    disc_radius: 0.4,
    size_jitter: 0.25,
    image_scale: 0.9,
    image_interaction: true,
    use_image_colors: false,
    pulse_speed: 1.5,
    pulse_amount: 0.3,
    snap_on_enter: false,
});

impl FieldConfig {
    /// 本次会话实际生效的指针半径
    ///
    /// 图像采样模式关闭交互时返回 0，力场衰减项处处为 0。
    pub fn effective_radius(&self) -> f32 {
        if self.distribution == DistributionKind::ImageSampled && !self.image_interaction {
            0.0
        } else {
            self.interaction_radius
        }
    }

    /// 图像模式闲置动画幅度，其它分布为 0
    pub fn effective_pulse_amount(&self) -> f32 {
        if self.distribution == DistributionKind::ImageSampled {
            self.pulse_amount
        } else {
            0.0
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.distribution != DistributionKind::ImageSampled
            && (self.particle_count == 0 || self.particle_count > MAX_PARTICLES)
        {
            return Err(ConfigError::ValidationError(format!(
                "particle_count must be in 1..={}, got {}",
                MAX_PARTICLES, self.particle_count
            )));
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(ConfigError::ValidationError(
                "point_size must be positive".to_string(),
            ));
        }
        if !(self.interaction_radius.is_finite() && self.interaction_radius >= 0.0) {
            return Err(ConfigError::ValidationError(
                "interaction_radius must be non-negative".to_string(),
            ));
        }
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "smoothing_factor must be in (0, 1), got {}",
                self.smoothing_factor
            )));
        }
        if self.sampling_stride == 0 {
            return Err(ConfigError::ValidationError(
                "sampling_stride must be at least 1".to_string(),
            ));
        }
        if !(self.size_jitter >= 0.0 && self.size_jitter < 1.0) {
            return Err(ConfigError::ValidationError(
                "size_jitter must be in [0, 1)".to_string(),
            ));
        }
        for (name, value) in [
            ("displacement_strength", self.displacement_strength),
            ("disc_radius", self.disc_radius),
            ("image_scale", self.image_scale),
            ("pulse_speed", self.pulse_speed),
            ("pulse_amount", self.pulse_amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be finite and non-negative",
                    name
                )));
            }
        }
        Ok(())
    }
}
