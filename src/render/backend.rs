//! 粒子场后端抽象
//!
//! 会话只通过 [`FieldBackend`] 与绘制层交互：
//!
//! - [`ParticlePipeline`](super::pipeline::ParticlePipeline)：wgpu 实现
//! - [`CpuReferenceBackend`]：在主机端按同一力场模型计算每个粒子的最终位置，
//!   用于测试和无 GPU 环境

use glam::{Vec2, Vec3};
use std::sync::{Arc, Mutex};

use super::force;
use super::particles::Particle;
use super::surface::BackingSize;
use crate::config::FieldConfig;
use crate::core::error::RenderResult;

/// 光晕通道的强度系数
pub const GLOW_INTENSITY: f32 = 0.35;

/// 每帧变化的 uniform 值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// 自动画开始以来的秒数
    pub time: f32,
    /// 平滑后的指针位置（场空间）
    pub pointer: Vec2,
    /// 衰减半径
    pub radius: f32,
    /// 全局着色颜色
    pub color: Vec3,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            pointer: crate::platform::pointer::POINTER_SENTINEL,
            radius: 0.0,
            color: Vec3::ONE,
        }
    }
}

/// 会话内不变的力场参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    pub strength: f32,
    pub pulse_speed: f32,
    pub pulse_amount: f32,
    pub glow_intensity: f32,
}

impl FieldParams {
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            strength: config.displacement_strength,
            pulse_speed: config.pulse_speed,
            pulse_amount: config.effective_pulse_amount(),
            glow_intensity: GLOW_INTENSITY,
        }
    }
}

/// 单帧绘制结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// 已提交并呈现
    Presented,
    /// 表面丢失或过期，已重新配置，本帧跳过
    Skipped,
}

/// 粒子场后端 Trait
pub trait FieldBackend {
    /// 后端名称
    fn name(&self) -> &str;

    /// 已上传的粒子数量
    fn particle_count(&self) -> usize;

    /// 背衬尺寸变化时重新配置表面与视口
    fn resize(&mut self, size: BackingSize);

    /// 写入每帧 uniform，不重新分配缓冲区
    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms);

    /// 绘制一帧
    fn draw_frame(&mut self) -> RenderResult<FrameStatus>;
}

/// 后端工厂
///
/// 挂载和重新配置时由会话调用，每次创建一个全新的后端实例。
pub trait BackendFactory {
    fn create_backend(
        &mut self,
        particles: &[Particle],
        config: &FieldConfig,
        backing: BackingSize,
    ) -> RenderResult<Box<dyn FieldBackend>>;
}

/// 主机端计算出的单个粒子绘制结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedParticle {
    /// 位移后的位置（场空间）
    pub position: Vec2,
    /// 位移后的位置（裁剪空间）
    pub clip: Vec2,
    /// 点直径（逻辑像素）
    pub size: f32,
    /// 透明度
    pub alpha: f32,
    /// 最终颜色
    pub color: Vec3,
}

/// CPU 后端的可观察状态
#[derive(Debug, Default, Clone)]
pub struct CaptureState {
    pub frames_drawn: u64,
    pub uniforms_written: u64,
    pub resizes: u64,
    pub backing: Option<BackingSize>,
    pub uniforms: Option<FrameUniforms>,
    pub last_frame: Vec<RenderedParticle>,
    pub released: bool,
}

/// 共享的捕获句柄，后端交给会话之后测试仍可读取
#[derive(Debug, Clone, Default)]
pub struct FrameCapture {
    inner: Arc<Mutex<CaptureState>>,
}

impl FrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> CaptureState {
        match self.inner.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut CaptureState)) {
        match self.inner.lock() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

/// CPU 参考后端
pub struct CpuReferenceBackend {
    particles: Vec<Particle>,
    params: FieldParams,
    backing: BackingSize,
    uniforms: FrameUniforms,
    capture: FrameCapture,
}

impl CpuReferenceBackend {
    pub fn new(
        particles: &[Particle],
        config: &FieldConfig,
        backing: BackingSize,
        capture: FrameCapture,
    ) -> Self {
        capture.update(|state| {
            state.backing = Some(backing);
            state.released = false;
        });
        Self {
            particles: particles.to_vec(),
            params: FieldParams::from_config(config),
            backing,
            uniforms: FrameUniforms::default(),
            capture,
        }
    }

    /// 按力场模型计算一个粒子
    pub fn evaluate(&self, particle: &Particle) -> RenderedParticle {
        let u = &self.uniforms;
        let d = force::displace(particle.origin, u.pointer, u.radius, self.params.strength);
        let size_pulse = force::pulse_size(
            u.time,
            self.params.pulse_speed,
            particle.phase,
            self.params.pulse_amount,
        );
        let alpha_pulse = force::pulse_alpha(
            u.time,
            self.params.pulse_speed,
            particle.phase,
            self.params.pulse_amount,
        );
        RenderedParticle {
            position: d.position,
            clip: d.position * self.backing.aspect_scale(),
            size: particle.size * d.size_scale * size_pulse,
            alpha: d.alpha * alpha_pulse,
            color: particle.color * u.color,
        }
    }
}

impl FieldBackend for CpuReferenceBackend {
    fn name(&self) -> &str {
        "cpu-reference"
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn resize(&mut self, size: BackingSize) {
        self.backing = size;
        self.capture.update(|state| {
            state.backing = Some(size);
            state.resizes += 1;
        });
    }

    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
        self.uniforms = *uniforms;
        self.capture.update(|state| {
            state.uniforms = Some(*uniforms);
            state.uniforms_written += 1;
        });
    }

    fn draw_frame(&mut self) -> RenderResult<FrameStatus> {
        let frame: Vec<RenderedParticle> =
            self.particles.iter().map(|p| self.evaluate(p)).collect();
        self.capture.update(|state| {
            state.last_frame = frame;
            state.frames_drawn += 1;
        });
        Ok(FrameStatus::Presented)
    }
}

impl Drop for CpuReferenceBackend {
    fn drop(&mut self) {
        self.capture.update(|state| state.released = true);
    }
}

/// CPU 后端工厂
#[derive(Debug, Clone, Default)]
pub struct CpuBackendFactory {
    capture: FrameCapture,
}

impl CpuBackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&self) -> FrameCapture {
        self.capture.clone()
    }
}

impl BackendFactory for CpuBackendFactory {
    fn create_backend(
        &mut self,
        particles: &[Particle],
        config: &FieldConfig,
        backing: BackingSize,
    ) -> RenderResult<Box<dyn FieldBackend>> {
        Ok(Box::new(CpuReferenceBackend::new(
            particles,
            config,
            backing,
            self.capture.clone(),
        )))
    }
}
