//! 渲染模块
//!
//! 主机端的颜色、力场、表面尺寸计算与 wgpu 绘制管线。

pub mod backend;
pub mod color;
pub mod force;
pub mod gpu;
pub mod particles;
pub mod pipeline;
pub mod surface;
pub mod uniforms;

pub use backend::{
    BackendFactory, CaptureState, CpuBackendFactory, CpuReferenceBackend, FieldBackend,
    FieldParams, FrameCapture, FrameStatus, FrameUniforms, RenderedParticle,
};
pub use gpu::GpuContext;
pub use particles::{DistributionGenerator, ImagePixels, Particle};
pub use pipeline::{ParticlePipeline, WgpuBackendFactory};
pub use surface::{BackingSize, SurfaceChange, SurfaceManager};
