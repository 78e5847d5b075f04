//! wgpu 设备与表面
//!
//! 适配器、设备或表面任一不可用都会返回 [`RenderError::DrawingContextUnavailable`]，
//! 此时会话不绘制任何内容。

use std::sync::Arc;
use winit::window::Window;

use super::surface::BackingSize;
use crate::config::WindowConfig;
use crate::core::error::{RenderError, RenderResult};

/// 请求的多重采样数
pub const MSAA_SAMPLES: u32 = 4;

/// GPU 上下文
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub format: wgpu::TextureFormat,
    pub present_mode: wgpu::PresentMode,
    pub alpha_mode: wgpu::CompositeAlphaMode,
    pub sample_count: u32,
}

impl GpuContext {
    /// 为窗口创建设备和表面
    pub async fn new(window: Arc<Window>, config: &WindowConfig) -> RenderResult<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::DrawingContextUnavailable(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                RenderError::DrawingContextUnavailable("no compatible GPU adapter".to_string())
            })?;

        let info = adapter.get_info();
        tracing::info!(
            target: "render",
            "Using adapter {} ({:?})",
            info.name,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Particle Field Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DrawingContextUnavailable(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        // 颜色在主机端按 0-1 线性值给出，优先非 sRGB 格式避免二次伽马
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                RenderError::DrawingContextUnavailable(
                    "surface reports no supported formats".to_string(),
                )
            })?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if config.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let sample_count = if config.antialias
            && adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            1
        };
        tracing::debug!(
            target: "render",
            "Surface format {:?}, {} sample(s)",
            format,
            sample_count
        );

        Ok(Self {
            device,
            queue,
            surface,
            format,
            present_mode,
            alpha_mode,
            sample_count,
        })
    }

    /// 设备允许的最大二维纹理边长
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// 给定背衬尺寸的表面配置
    pub fn surface_config(&self, size: BackingSize) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width: size.width,
            height: size.height,
            present_mode: self.present_mode,
            alpha_mode: self.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }
}
