use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window as WinitWindowRaw, WindowBuilder};

use crate::config::WindowConfig;
use crate::core::error::{FieldError, FieldResult};

/// 承载粒子场的原生窗口
///
/// 内部以 `Arc` 持有窗口，使 wgpu 表面可以获得 `'static` 生命周期。
#[derive(Clone)]
pub struct WinitWindow {
    window: Arc<WinitWindowRaw>,
}

impl WinitWindow {
    pub fn new<T>(event_loop: &EventLoop<T>, config: &WindowConfig) -> FieldResult<Self> {
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .build(event_loop)
            .map_err(|e| FieldError::Window(e.to_string()))?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    /// 供表面创建使用的共享句柄
    pub fn shared(&self) -> Arc<WinitWindowRaw> {
        Arc::clone(&self.window)
    }

    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    /// 逻辑尺寸（物理像素 / 像素比）
    pub fn logical_size(&self) -> (f64, f64) {
        let logical = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        (logical.width, logical.height)
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
