//! 粒子场会话
//!
//! 会话拥有指针跟踪器、绘制后端和动画循环，生命周期为：
//!
//! ```text
//! Created ──mount──▶ Mounted ──start──▶ Running ──cancel──▶ Stopped
//!    │                  ▲                  │
//!    └─(图像未就绪)─▶ AwaitingImage         └──渲染错误──▶ Failed
//!
//! 任意状态 ──dispose──▶ Disposed
//! ```
//!
//! 释放顺序固定为：断开指针输入、取消循环、释放管线。

use rand::Rng;
use std::time::Instant;

use super::animation::{AnimationLoop, CancelSignal, TickOutcome};
use super::error::{AssetError, FieldError, FieldResult};
use crate::config::FieldConfig;
use crate::platform::pointer::{PointerState, PointerTracker};
use crate::render::backend::{BackendFactory, FieldBackend};
use crate::render::color;
use crate::render::particles::{DistributionGenerator, ImagePixels};
use crate::render::surface::{BackingSize, SurfaceChange, SurfaceManager};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    AwaitingImage,
    Mounted,
    Running,
    Stopped,
    Failed,
    Disposed,
}

/// 粒子场会话
pub struct FieldSession {
    config: FieldConfig,
    state: SessionState,
    surface: SurfaceManager,
    tracker: PointerTracker,
    input_attached: bool,
    cancel: CancelSignal,
    animation: AnimationLoop,
    factory: Box<dyn BackendFactory>,
    backend: Option<Box<dyn FieldBackend>>,
    image: Option<ImagePixels>,
    start_requested: Option<Instant>,
}

impl FieldSession {
    pub fn new(config: FieldConfig, factory: Box<dyn BackendFactory>) -> FieldResult<Self> {
        config.validate()?;
        let cancel = CancelSignal::new();
        Ok(Self {
            tracker: Self::tracker_for(&config),
            animation: Self::animation_for(&config, cancel.clone()),
            surface: SurfaceManager::default(),
            input_attached: true,
            state: SessionState::Created,
            backend: None,
            image: None,
            start_requested: None,
            config,
            cancel,
            factory,
        })
    }

    fn tracker_for(config: &FieldConfig) -> PointerTracker {
        PointerTracker::new(config.smoothing_factor).with_snap_on_enter(config.snap_on_enter)
    }

    fn animation_for(config: &FieldConfig, cancel: CancelSignal) -> AnimationLoop {
        AnimationLoop::new(
            cancel,
            config.effective_radius(),
            color::parse_hex(&config.color),
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// 共享的取消信号（例如交给 Ctrl-C 处理器）
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    pub fn pointer(&self) -> PointerState {
        self.tracker.state()
    }

    pub fn frames(&self) -> u64 {
        self.animation.frames()
    }

    pub fn backing_size(&self) -> Option<BackingSize> {
        self.surface.current()
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.name())
    }

    pub fn particle_count(&self) -> usize {
        self.backend.as_ref().map_or(0, |b| b.particle_count())
    }

    /// 限制背衬尺寸（通常取设备最大纹理边长）
    pub fn set_max_dimension(&mut self, max_dimension: u32) {
        self.surface.set_max_dimension(max_dimension);
    }

    /// 表面逻辑尺寸或像素比变化
    pub fn resize(&mut self, logical: (f64, f64), device_pixel_ratio: f64) -> SurfaceChange {
        let change = self.surface.apply(logical, device_pixel_ratio);
        if let SurfaceChange::Resized(size) = change {
            self.tracker
                .set_surface_size(size.width as f32, size.height as f32);
            if let Some(backend) = self.backend.as_mut() {
                backend.resize(size);
            }
        }
        change
    }

    /// 挂载：生成粒子并创建后端
    pub fn mount(&mut self, image: Option<ImagePixels>) -> FieldResult<()> {
        self.mount_with_rng(image, &mut rand::thread_rng())
    }

    pub fn mount_with_rng<R: Rng + ?Sized>(
        &mut self,
        image: Option<ImagePixels>,
        rng: &mut R,
    ) -> FieldResult<()> {
        match self.state {
            SessionState::Created | SessionState::AwaitingImage => {}
            other => {
                return Err(FieldError::InvalidState(format!(
                    "cannot mount a session in state {:?}",
                    other
                )))
            }
        }
        if image.is_some() {
            self.image = image;
        }
        let backing = self.surface.current().ok_or_else(|| {
            FieldError::InvalidState("surface size unknown, resize before mount".to_string())
        })?;

        let generated = DistributionGenerator::new(&self.config).generate(self.image.as_ref(), rng);
        let particles = match generated {
            Ok(particles) => particles,
            Err(AssetError::ImageDecodeIncomplete) => {
                tracing::debug!(target: "field", "Source image not decoded yet, deferring mount");
                self.state = SessionState::AwaitingImage;
                return Ok(());
            }
            Err(e) => return Err(self.fail(e.into())),
        };

        let backend = self
            .factory
            .create_backend(&particles, &self.config, backing)
            .map_err(|e| self.fail(e.into()))?;
        tracing::info!(
            target: "field",
            "Mounted {} particles on {} backend ({}x{})",
            backend.particle_count(),
            backend.name(),
            backing.width,
            backing.height
        );
        self.backend = Some(backend);
        self.state = SessionState::Mounted;

        if let Some(now) = self.start_requested.take() {
            self.start(now)?;
        }
        Ok(())
    }

    /// 图像解码完成后由宿主调用
    pub fn provide_image(&mut self, pixels: ImagePixels) -> FieldResult<()> {
        if self.state == SessionState::AwaitingImage {
            self.mount(Some(pixels))
        } else {
            self.image = Some(pixels);
            Ok(())
        }
    }

    /// 开始动画；图像尚未就绪时推迟到挂载完成
    pub fn start(&mut self, now: Instant) -> FieldResult<()> {
        match self.state {
            SessionState::Mounted => {
                self.animation.start(now);
                self.state = SessionState::Running;
                tracing::debug!(target: "field", "Animation started");
                Ok(())
            }
            SessionState::Running => Ok(()),
            SessionState::Created | SessionState::AwaitingImage => {
                self.start_requested = Some(now);
                Ok(())
            }
            other => Err(FieldError::InvalidState(format!(
                "cannot start a session in state {:?}",
                other
            ))),
        }
    }

    /// 推进一帧
    pub fn tick(&mut self, now: Instant) -> FieldResult<TickOutcome> {
        if self.state != SessionState::Running {
            return Ok(TickOutcome::Stopped);
        }
        let (Some(backend), Some(backing)) = (self.backend.as_deref_mut(), self.surface.current())
        else {
            return Ok(TickOutcome::Stopped);
        };
        match self
            .animation
            .tick(now, &mut self.tracker, backing, backend)
        {
            Ok(TickOutcome::Stopped) => {
                tracing::debug!(target: "field", "Animation cancelled after {} frames", self.animation.frames());
                self.state = SessionState::Stopped;
                Ok(TickOutcome::Stopped)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.backend = None;
                Err(self.fail(e.into()))
            }
        }
    }

    /// 设备像素坐标的指针移动
    pub fn pointer_moved(&mut self, px: f32, py: f32) {
        if self.input_attached {
            self.tracker.on_move(px, py);
        }
    }

    pub fn pointer_left(&mut self) {
        if self.input_attached {
            self.tracker.on_leave();
        }
    }

    /// 应用新配置：重新生成粒子并重建管线
    pub fn reconfigure(&mut self, config: FieldConfig) -> FieldResult<()> {
        if self.state == SessionState::Disposed {
            return Err(FieldError::InvalidState(
                "cannot reconfigure a disposed session".to_string(),
            ));
        }
        config.validate()?;
        let resume = matches!(self.state, SessionState::Running);

        self.backend = None;
        if config.source_image != self.config.source_image {
            self.image = None;
        }
        if self.cancel.is_cancelled() {
            self.cancel = CancelSignal::new();
        }
        self.tracker = Self::tracker_for(&config);
        if let Some(size) = self.surface.current() {
            self.tracker
                .set_surface_size(size.width as f32, size.height as f32);
        }
        self.animation = Self::animation_for(&config, self.cancel.clone());
        self.config = config;
        self.state = SessionState::Created;
        tracing::info!(target: "field", "Reconfiguring particle field");

        if resume {
            self.start_requested = Some(Instant::now());
        }
        self.mount(None)
    }

    /// 释放会话，可重复调用
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        self.input_attached = false;
        self.cancel.cancel();
        self.backend = None;
        self.start_requested = None;
        self.state = SessionState::Disposed;
        tracing::info!(
            target: "field",
            "Particle field disposed after {} frames",
            self.animation.frames()
        );
    }

    fn fail(&mut self, error: FieldError) -> FieldError {
        tracing::error!(target: "field", "Particle field failed: {}", error);
        self.state = SessionState::Failed;
        error
    }
}

impl Drop for FieldSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistributionKind;
    use crate::core::error::RenderError;
    use crate::render::backend::CpuBackendFactory;
    use crate::render::particles::Particle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    struct FailingFactory;

    impl BackendFactory for FailingFactory {
        fn create_backend(
            &mut self,
            _particles: &[Particle],
            _config: &FieldConfig,
            _backing: BackingSize,
        ) -> crate::core::error::RenderResult<Box<dyn FieldBackend>> {
            Err(RenderError::ShaderCompileFailed("unexpected token".to_string()))
        }
    }

    fn session(config: FieldConfig) -> (FieldSession, crate::render::backend::FrameCapture) {
        let factory = CpuBackendFactory::new();
        let capture = factory.capture();
        let mut session = FieldSession::new(config, Box::new(factory)).unwrap();
        session.resize((200.0, 100.0), 1.0);
        (session, capture)
    }

    fn opaque(width: u32, height: u32) -> ImagePixels {
        ImagePixels::new(width, height, [0, 0, 0, 255].repeat((width * height) as usize)).unwrap()
    }

    #[test]
    fn test_mount_start_tick() {
        let (mut session, capture) = session(FieldConfig {
            particle_count: 64,
            ..Default::default()
        });
        session
            .mount_with_rng(None, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(session.state(), SessionState::Mounted);
        assert_eq!(session.particle_count(), 64);

        let t0 = Instant::now();
        session.start(t0).unwrap();
        assert_eq!(session.state(), SessionState::Running);
        for i in 0..3 {
            let outcome = session.tick(t0 + Duration::from_millis(16 * i)).unwrap();
            assert!(matches!(outcome, TickOutcome::Continue(_)));
        }
        assert_eq!(capture.snapshot().frames_drawn, 3);
        assert_eq!(session.frames(), 3);
    }

    #[test]
    fn test_mount_requires_surface_size() {
        let mut session =
            FieldSession::new(FieldConfig::default(), Box::new(CpuBackendFactory::new())).unwrap();
        assert!(matches!(
            session.mount(None),
            Err(FieldError::InvalidState(_))
        ));
    }

    #[test]
    fn test_image_mode_waits_for_pixels() {
        let (mut session, capture) = session(FieldConfig {
            distribution: DistributionKind::ImageSampled,
            sampling_stride: 1,
            ..Default::default()
        });
        session.mount(None).unwrap();
        assert_eq!(session.state(), SessionState::AwaitingImage);
        assert_eq!(session.backend_name(), None);

        let t0 = Instant::now();
        session.start(t0).unwrap();
        assert_eq!(session.tick(t0).unwrap(), TickOutcome::Stopped);

        session.provide_image(opaque(4, 3)).unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.particle_count(), 12);
        assert!(matches!(session.tick(t0).unwrap(), TickOutcome::Continue(_)));
        assert_eq!(capture.snapshot().frames_drawn, 1);
    }

    #[test]
    fn test_backend_failure_marks_session_failed() {
        let mut session =
            FieldSession::new(FieldConfig::default(), Box::new(FailingFactory)).unwrap();
        session.resize((100.0, 100.0), 1.0);
        let err = session.mount(None).unwrap_err();
        assert!(matches!(
            err,
            FieldError::Render(RenderError::ShaderCompileFailed(_))
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.tick(Instant::now()).unwrap(), TickOutcome::Stopped);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = FieldConfig {
            smoothing_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            FieldSession::new(config, Box::new(CpuBackendFactory::new())),
            Err(FieldError::Config(_))
        ));
    }

    #[test]
    fn test_resize_forwards_to_backend_once() {
        let (mut session, capture) = session(FieldConfig::default());
        session.mount(None).unwrap();
        assert!(matches!(
            session.resize((300.0, 100.0), 2.0),
            SurfaceChange::Resized(_)
        ));
        assert!(matches!(
            session.resize((300.0, 100.0), 2.0),
            SurfaceChange::Unchanged(_)
        ));
        let state = capture.snapshot();
        assert_eq!(state.resizes, 1);
        assert_eq!(state.backing, Some(BackingSize::new(600, 200, 2.0)));
    }

    #[test]
    fn test_external_cancel_stops_loop() {
        let (mut session, capture) = session(FieldConfig::default());
        session.mount(None).unwrap();
        let t0 = Instant::now();
        session.start(t0).unwrap();
        session.tick(t0).unwrap();

        session.cancel_signal().cancel();
        assert_eq!(session.tick(t0).unwrap(), TickOutcome::Stopped);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(capture.snapshot().frames_drawn, 1);
    }

    #[test]
    fn test_dispose_order_and_idempotence() {
        let (mut session, capture) = session(FieldConfig::default());
        session.mount(None).unwrap();
        let t0 = Instant::now();
        session.start(t0).unwrap();
        session.tick(t0).unwrap();
        let cancel = session.cancel_signal();

        session.dispose();
        assert!(cancel.is_cancelled());
        assert!(capture.snapshot().released);
        assert_eq!(session.state(), SessionState::Disposed);

        // 断开后的指针事件被忽略
        let before = session.pointer();
        session.pointer_moved(10.0, 10.0);
        assert_eq!(session.pointer(), before);

        assert_eq!(session.tick(t0).unwrap(), TickOutcome::Stopped);
        assert_eq!(capture.snapshot().frames_drawn, 1);

        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
        assert!(session.reconfigure(FieldConfig::default()).is_err());
    }

    #[test]
    fn test_reconfigure_rebuilds_and_resumes() {
        let (mut session, capture) = session(FieldConfig {
            particle_count: 10,
            ..Default::default()
        });
        session.mount(None).unwrap();
        session.start(Instant::now()).unwrap();

        session
            .reconfigure(FieldConfig {
                particle_count: 25,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.particle_count(), 25);
        assert!(!capture.snapshot().released);
    }
}
