//! 动画循环
//!
//! 每次 tick：检查取消信号，计算经过时间，平滑指针一步，写入 uniform，绘制一帧。
//! 下一帧由宿主通过 `request_redraw` 调度。

use glam::Vec3;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::error::RenderResult;
use crate::platform::pointer::PointerTracker;
use crate::render::backend::{FieldBackend, FrameStatus, FrameUniforms};
use crate::render::surface::BackingSize;

/// 帧率报告间隔
pub const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// 取消信号，可在线程间克隆共享
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 已绘制（或跳过）一帧，宿主应调度下一帧
    Continue(FrameStatus),
    /// 循环已取消
    Stopped,
}

#[derive(Debug, Clone)]
struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
}

impl FpsCounter {
    fn record(&mut self, now: Instant) {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= FPS_REPORT_INTERVAL {
            let fps = self.frames as f64 / elapsed.as_secs_f64();
            tracing::debug!(target: "render", "{:.1} fps over {:.1}s", fps, elapsed.as_secs_f64());
            self.window_start = Some(now);
            self.frames = 0;
        }
    }
}

/// 动画循环
#[derive(Debug, Clone)]
pub struct AnimationLoop {
    started: Option<Instant>,
    cancel: CancelSignal,
    frames: u64,
    radius: f32,
    color: Vec3,
    fps: FpsCounter,
}

impl AnimationLoop {
    pub fn new(cancel: CancelSignal, radius: f32, color: Vec3) -> Self {
        Self {
            started: None,
            cancel,
            frames: 0,
            radius,
            color,
            fps: FpsCounter {
                window_start: None,
                frames: 0,
            },
        }
    }

    /// 记录起始时刻；未调用时以第一次 tick 为起点
    pub fn start(&mut self, now: Instant) {
        self.started.get_or_insert(now);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 距起始时刻的秒数
    pub fn elapsed(&self, now: Instant) -> f32 {
        self.started
            .map(|start| now.saturating_duration_since(start).as_secs_f32())
            .unwrap_or(0.0)
    }

    pub fn tick(
        &mut self,
        now: Instant,
        tracker: &mut PointerTracker,
        backing: BackingSize,
        backend: &mut dyn FieldBackend,
    ) -> RenderResult<TickOutcome> {
        if self.cancel.is_cancelled() {
            return Ok(TickOutcome::Stopped);
        }
        self.start(now);
        let time = self.elapsed(now);
        let smoothed = tracker.step();

        backend.set_frame_uniforms(&FrameUniforms {
            time,
            pointer: backing.ndc_to_field(smoothed),
            radius: self.radius,
            color: self.color,
        });
        let status = backend.draw_frame()?;

        self.frames += 1;
        self.fps.record(now);
        Ok(TickOutcome::Continue(status))
    }
}
