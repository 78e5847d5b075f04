//! 宿主事件循环
//!
//! 负责初始化日志、创建窗口和 GPU 上下文、在工作线程中解码源图像，
//! 并把 winit 事件转发给 [`FieldSession`]。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};

use super::animation::TickOutcome;
use super::error::{AssetResult, FieldError, FieldResult};
use super::session::{FieldSession, SessionState};
use crate::config::{AppConfig, DistributionKind, LoggingConfig};
use crate::platform::WinitWindow;
use crate::render::color;
use crate::render::gpu::GpuContext;
use crate::render::particles::ImagePixels;
use crate::render::pipeline::WgpuBackendFactory;

/// 事件循环的用户事件
#[derive(Debug)]
pub enum UserEvent {
    /// 工作线程完成源图像解码
    ImageDecoded(AssetResult<ImagePixels>),
}

/// 初始化日志
///
/// `RUST_LOG` 优先于配置文件中的级别。重复调用无副作用。
pub fn initialize_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.filter_directives()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 在工作线程中解码图像，结果通过事件循环代理送回
fn spawn_image_decoder(path: PathBuf, proxy: EventLoopProxy<UserEvent>) {
    std::thread::spawn(move || {
        tracing::debug!(target: "field", "Decoding source image {}", path.display());
        let decoded = ImagePixels::load(&path);
        if proxy.send_event(UserEvent::ImageDecoded(decoded)).is_err() {
            tracing::debug!(target: "field", "Event loop closed before image decoding finished");
        }
    });
}

/// 粒子场应用
pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// 运行直到窗口关闭或循环被取消
    pub fn run(self) -> FieldResult<()> {
        initialize_logging(&self.config.logging);
        tracing::info!(target: "field", "Particle field starting");

        let AppConfig {
            window: window_config,
            field: mut field_config,
            ..
        } = self.config;

        if field_config.distribution == DistributionKind::ImageSampled
            && field_config.source_image.is_none()
        {
            tracing::warn!(
                target: "field",
                "Image sampling selected without a source image, using disc distribution"
            );
            field_config.distribution = DistributionKind::DiscDensityCorrected;
        }

        let event_loop = EventLoopBuilder::<UserEvent>::with_user_event()
            .build()
            .map_err(|e| FieldError::EventLoop(format!("Failed to create event loop: {}", e)))?;
        let window = WinitWindow::new(&event_loop, &window_config)?;

        let gpu = Arc::new(pollster::block_on(GpuContext::new(
            window.shared(),
            &window_config,
        ))?);
        let clear_color = color::to_clear_color(color::parse_hex(&window_config.background));
        let max_dimension = gpu.max_texture_dimension();
        let factory = WgpuBackendFactory::new(gpu, clear_color);

        if field_config.distribution == DistributionKind::ImageSampled {
            if let Some(path) = field_config.source_image.clone() {
                spawn_image_decoder(path, event_loop.create_proxy());
            }
        }

        let mut session = FieldSession::new(field_config, Box::new(factory))?;
        session.set_max_dimension(max_dimension);
        session.resize(window.logical_size(), window.scale_factor());
        session.mount(None)?;
        session.start(Instant::now())?;
        window.request_redraw();

        let mut failure: Option<FieldError> = None;
        let failure_slot = &mut failure;
        let result = event_loop.run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            match event {
                Event::WindowEvent { event, .. } => {
                    Self::handle_window_event(&event, &mut session, &window, elwt, failure_slot);
                }
                Event::UserEvent(UserEvent::ImageDecoded(decoded)) => {
                    let outcome = decoded
                        .map_err(FieldError::from)
                        .and_then(|pixels| session.provide_image(pixels));
                    match outcome {
                        Ok(()) => window.request_redraw(),
                        Err(e) => Self::abort(e, &mut session, elwt, failure_slot),
                    }
                }
                Event::LoopExiting => session.dispose(),
                _ => {}
            }
        });

        result.map_err(|e| FieldError::EventLoop(format!("Event loop error: {}", e)))?;
        tracing::info!(target: "field", "Particle field shutting down");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn handle_window_event(
        event: &WindowEvent,
        session: &mut FieldSession,
        window: &WinitWindow,
        elwt: &EventLoopWindowTarget<UserEvent>,
        failure: &mut Option<FieldError>,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                session.dispose();
                elwt.exit();
            }
            WindowEvent::Resized(_) => {
                session.resize(window.logical_size(), window.scale_factor());
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                session.resize(window.logical_size(), *scale_factor);
                window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                tracing::trace!(target: "input", "Pointer at {:.1}, {:.1}", position.x, position.y);
                session.pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                tracing::trace!(target: "input", "Pointer left surface");
                session.pointer_left();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    session.cancel_signal().cancel();
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => match session.tick(Instant::now()) {
                Ok(TickOutcome::Continue(_)) => window.request_redraw(),
                Ok(TickOutcome::Stopped) => {
                    if session.state() == SessionState::Stopped {
                        session.dispose();
                        elwt.exit();
                    }
                }
                Err(e) => Self::abort(e, session, elwt, failure),
            },
            _ => {}
        }
    }

    fn abort(
        error: FieldError,
        session: &mut FieldSession,
        elwt: &EventLoopWindowTarget<UserEvent>,
        failure: &mut Option<FieldError>,
    ) {
        session.dispose();
        if failure.is_none() {
            *failure = Some(error);
        }
        elwt.exit();
    }
}
