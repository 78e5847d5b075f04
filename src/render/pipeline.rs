//! 粒子绘制管线
//!
//! 挂载时编译着色器、创建渲染管线并上传实例缓冲；之后每帧只写一次 uniform
//! 并发出一次实例化绘制（启用光晕时先多一次加法混合的光晕绘制）。

use std::sync::Arc;
use wgpu::util::DeviceExt;

use super::backend::{
    BackendFactory, FieldBackend, FieldParams, FrameStatus, FrameUniforms,
};
use super::gpu::GpuContext;
use super::particles::{pack_instances, GpuParticle, Particle};
use super::surface::BackingSize;
use super::uniforms::{FieldUniforms, QuadVertex, QUAD_VERTICES};
use crate::config::FieldConfig;
use crate::core::error::{RenderError, RenderResult};

const PARTICLE_SHADER: &str = include_str!("shader_particles.wgsl");

/// 加法混合，用于光晕通道
const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// 粒子管线
pub struct ParticlePipeline {
    gpu: Arc<GpuContext>,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    glow_pipeline: Option<wgpu::RenderPipeline>,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    msaa_view: Option<wgpu::TextureView>,
    params: FieldParams,
    backing: BackingSize,
    clear_color: wgpu::Color,
}

impl ParticlePipeline {
    pub fn new(
        gpu: Arc<GpuContext>,
        particles: &[Particle],
        config: &FieldConfig,
        backing: BackingSize,
        clear_color: wgpu::Color,
    ) -> RenderResult<Self> {
        let device = &gpu.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!(target: "render", "Shader compilation failed: {}", err);
            return Err(RenderError::ShaderCompileFailed(err.to_string()));
        }

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Uniform BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<FieldUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&uniform_bgl],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = create_render_pipeline(
            device,
            &pipeline_layout,
            &shader,
            gpu.format,
            gpu.sample_count,
            ("vs_main", "fs_main"),
            wgpu::BlendState::ALPHA_BLENDING,
        );
        let glow_pipeline = config.glow_enabled.then(|| {
            create_render_pipeline(
                device,
                &pipeline_layout,
                &shader,
                gpu.format,
                gpu.sample_count,
                ("vs_glow", "fs_glow"),
                ADDITIVE_BLENDING,
            )
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!(target: "render", "Render pipeline creation failed: {}", err);
            return Err(RenderError::ProgramLinkFailed(err.to_string()));
        }

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut instances = pack_instances(particles);
        let instance_count = instances.len() as u32;
        if instances.is_empty() {
            // 空缓冲区无法绑定，保留一个不会被绘制的占位实例
            instances.push(bytemuck::Zeroable::zeroed());
        }
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instances"),
            contents: bytemuck::cast_slice::<GpuParticle, u8>(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let params = FieldParams::from_config(config);
        let initial = FieldUniforms::compose(&FrameUniforms::default(), &params, backing);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Uniforms"),
            contents: bytemuck::bytes_of(&initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Uniform BG"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let surface_config = gpu.surface_config(backing);
        gpu.surface.configure(device, &surface_config);
        let msaa_view = create_msaa_view(&gpu, &surface_config);

        tracing::info!(
            target: "render",
            "Particle pipeline ready: {} instances, glow {}",
            instance_count,
            if config.glow_enabled { "on" } else { "off" }
        );

        Ok(Self {
            gpu,
            surface_config,
            pipeline,
            glow_pipeline,
            quad_buffer,
            instance_buffer,
            instance_count,
            uniform_buffer,
            uniform_bind_group,
            msaa_view,
            params,
            backing,
            clear_color,
        })
    }

    fn encode_pass(&self, target: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Encoder"),
            });
        {
            let (view, resolve_target, store) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(target), wgpu::StoreOp::Discard),
                None => (target, None, wgpu::StoreOp::Store),
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if self.instance_count > 0 {
                rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
                rpass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                let vertices = 0..QUAD_VERTICES.len() as u32;
                if let Some(glow) = &self.glow_pipeline {
                    rpass.set_pipeline(glow);
                    rpass.draw(vertices.clone(), 0..self.instance_count);
                }
                rpass.set_pipeline(&self.pipeline);
                rpass.draw(vertices, 0..self.instance_count);
            }
        }
        encoder.finish()
    }
}

impl FieldBackend for ParticlePipeline {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn particle_count(&self) -> usize {
        self.instance_count as usize
    }

    fn resize(&mut self, size: BackingSize) {
        self.backing = size;
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.gpu
            .surface
            .configure(&self.gpu.device, &self.surface_config);
        self.msaa_view = create_msaa_view(&self.gpu, &self.surface_config);
    }

    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms) {
        let block = FieldUniforms::compose(uniforms, &self.params, self.backing);
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&block));
    }

    fn draw_frame(&mut self) -> RenderResult<FrameStatus> {
        let _span = tracing::info_span!(target: "render", "frame").entered();
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!(target: "render", "Surface lost or outdated, reconfiguring");
                self.gpu
                    .surface
                    .configure(&self.gpu.device, &self.surface_config);
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!(target: "render", "Surface acquire timed out");
                return Ok(FrameStatus::Skipped);
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode_pass(&target);
        self.gpu.queue.submit(std::iter::once(commands));
        frame.present();
        Ok(FrameStatus::Presented)
    }
}

fn create_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    sample_count: u32,
    (vs_entry, fs_entry): (&str, &str),
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(vs_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: vs_entry,
            buffers: &[
                QuadVertex::vertex_buffer_layout(),
                GpuParticle::vertex_buffer_layout(),
            ],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: fs_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
    })
}

fn create_msaa_view(
    gpu: &GpuContext,
    config: &wgpu::SurfaceConfiguration,
) -> Option<wgpu::TextureView> {
    if gpu.sample_count <= 1 {
        return None;
    }
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Particle MSAA Target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: gpu.sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

/// wgpu 后端工厂
pub struct WgpuBackendFactory {
    gpu: Arc<GpuContext>,
    clear_color: wgpu::Color,
}

impl WgpuBackendFactory {
    pub fn new(gpu: Arc<GpuContext>, clear_color: wgpu::Color) -> Self {
        Self { gpu, clear_color }
    }
}

impl BackendFactory for WgpuBackendFactory {
    fn create_backend(
        &mut self,
        particles: &[Particle],
        config: &FieldConfig,
        backing: BackingSize,
    ) -> RenderResult<Box<dyn FieldBackend>> {
        let pipeline = ParticlePipeline::new(
            Arc::clone(&self.gpu),
            particles,
            config,
            backing,
            self.clear_color,
        )?;
        Ok(Box::new(pipeline))
    }
}
