//! 粒子记录
//!
//! `origin` 在创建时固定；当前位置每帧由 `origin`、指针状态和时间重新计算，
//! 从不回写。

use glam::{Vec2, Vec3};

/// 粒子
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// 初始位置（场空间）
    pub origin: Vec2,
    /// 点直径（逻辑像素）
    pub size: f32,
    /// 闲置动画的相位偏移（弧度）
    pub phase: f32,
    /// 粒子自身颜色，与全局着色颜色相乘
    pub color: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            size: 1.0,
            phase: 0.0,
            color: Vec3::ONE,
        }
    }
}

/// GPU 实例结构（对应 WGSL 顶点输入）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuParticle {
    /// 初始位置
    pub origin: [f32; 2],
    /// 点直径
    pub size: f32,
    /// 相位
    pub phase: f32,
    /// 颜色 (r, g, b, a)
    pub color: [f32; 4],
}

impl From<&Particle> for GpuParticle {
    fn from(p: &Particle) -> Self {
        Self {
            origin: p.origin.to_array(),
            size: p.size,
            phase: p.phase,
            color: [p.color.x, p.color.y, p.color.z, 1.0],
        }
    }
}

impl GpuParticle {
    /// 实例顶点缓冲布局（每帧不变）
    pub fn vertex_buffer_layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x4,
            },
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuParticle>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// 打包为 GPU 实例数组
pub fn pack_instances(particles: &[Particle]) -> Vec<GpuParticle> {
    particles.iter().map(GpuParticle::from).collect()
}
