//! GPU uniform 与顶点布局
//!
//! 与 `shader_particles.wgsl` 中的 `FieldUniforms`、`VertexInput` 一一对应。

use super::backend::{FieldParams, FrameUniforms};
use super::surface::BackingSize;

/// Uniform 块（64 字节，满足 WGSL uniform 对齐规则）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FieldUniforms {
    pub aspect: [f32; 2],
    pub pixel_to_clip: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
    pub radius: f32,
    pub color: [f32; 3],
    pub strength: f32,
    pub pulse_speed: f32,
    pub pulse_amount: f32,
    pub glow_intensity: f32,
    pub _pad: f32,
}

impl FieldUniforms {
    /// 合成每帧 uniform
    pub fn compose(frame: &FrameUniforms, params: &FieldParams, backing: BackingSize) -> Self {
        Self {
            aspect: backing.aspect_scale().to_array(),
            pixel_to_clip: backing.logical_pixel_to_clip().to_array(),
            pointer: frame.pointer.to_array(),
            time: frame.time,
            radius: frame.radius,
            color: frame.color.to_array(),
            strength: params.strength,
            pulse_speed: params.pulse_speed,
            pulse_amount: params.pulse_amount,
            glow_intensity: params.glow_intensity,
            _pad: 0.0,
        }
    }
}

/// 四边形顶点
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub corner: [f32; 2],
}

/// 两个三角形组成的单位四边形，角点坐标在 [-1, 1]
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, 1.0] },
];

impl QuadVertex {
    pub fn vertex_buffer_layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        }];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}
