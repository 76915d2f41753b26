//! wgpu backend for the overlay graphics device.
//!
//! Renders into an offscreen RGBA target sized to the viewer container.
//! Draw calls are recorded during the frame and replayed into a single
//! render pass on `end_frame`, which keeps the trait object-safe and the
//! encoder lifetime contained.

use std::collections::HashMap;
use std::mem;

use glam::UVec2;
use pollster::FutureExt;
use wgpu::util::DeviceExt;

use crate::device::{
    BufferHandle, GraphicsDevice, PassUniforms, PipelineDesc, PipelineHandle, PipelineKind,
};
use crate::error::{OverlayError, Result};
use crate::frame::{CentroidInstance, PolyVertex};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct GpuBuffer {
    raw: Option<wgpu::Buffer>,
    capacity: u64,
    label: String,
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

enum RecordedDraw {
    Instanced {
        pipeline: PipelineHandle,
        mesh: BufferHandle,
        instances: BufferHandle,
        uniforms: PassUniforms,
        vertex_count: u32,
        instance_count: u32,
    },
    Indexed {
        pipeline: PipelineHandle,
        vertices: BufferHandle,
        indices: BufferHandle,
        uniforms: PassUniforms,
        index_count: u32,
    },
    Lines {
        pipeline: PipelineHandle,
        vertices: BufferHandle,
        uniforms: PassUniforms,
        vertex_count: u32,
    },
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    centroid_shader: wgpu::ShaderModule,
    polygon_shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineHandle, wgpu::RenderPipeline>,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    uniform_slots: Vec<UniformSlot>,
    recorded: Vec<RecordedDraw>,
    in_frame: bool,
    next_handle: u32,
}

impl WgpuDevice {
    /// Bring up a headless device on the first suitable adapter.
    pub fn headless(target_size: UVec2) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .block_on()
            .map_err(|e| OverlayError::AdapterUnavailable(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("overlay device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .block_on()
            .map_err(|e| OverlayError::DeviceRequest(e.to_string()))?;

        Ok(Self::with_device(device, queue, target_size))
    }

    /// Wrap an existing device/queue pair, rendering into a fresh
    /// offscreen target.
    pub fn with_device(device: wgpu::Device, queue: wgpu::Queue, target_size: UVec2) -> Self {
        let centroid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("centroid shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("centroid.wgsl").into()),
        });
        let polygon_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("polygon shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("polygon.wgsl").into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pass uniforms layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            mem::size_of::<PassUniforms>() as u64
                        ),
                    },
                    count: None,
                }],
            });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let (target, target_view) = Self::create_target(&device, target_size);

        WgpuDevice {
            device,
            queue,
            target,
            target_view,
            centroid_shader,
            polygon_shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            buffers: HashMap::new(),
            uniform_slots: Vec::new(),
            recorded: Vec::new(),
            in_frame: false,
            next_handle: 0,
        }
    }

    /// Match the render target to a resized viewer container.
    pub fn resize_target(&mut self, target_size: UVec2) {
        if self.target.width() != target_size.x || self.target.height() != target_size.y {
            let (target, view) = Self::create_target(&self.device, target_size);
            self.target = target;
            self.target_view = view;
        }
    }

    /// The texture the host composites over the slide viewer.
    pub fn target_view(&self) -> &wgpu::TextureView {
        &self.target_view
    }

    fn create_target(
        device: &wgpu::Device,
        size: UVec2,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("overlay target"),
            size: wgpu::Extent3d {
                width: size.x.max(1),
                height: size.y.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        (target, view)
    }

    fn next_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn build_pipeline(&self, kind: PipelineKind, label: &str) -> wgpu::RenderPipeline {
        let mesh_layout = wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            }],
        };
        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<CentroidInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 8,
                    shader_location: 2,
                },
            ],
        };
        let poly_layout = wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PolyVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 8,
                    shader_location: 1,
                },
            ],
        };

        let (shader, buffers, topology): (_, Vec<wgpu::VertexBufferLayout>, _) = match kind {
            PipelineKind::CentroidInstanced => (
                &self.centroid_shader,
                vec![mesh_layout, instance_layout],
                wgpu::PrimitiveTopology::TriangleList,
            ),
            PipelineKind::PolygonFill => (
                &self.polygon_shader,
                vec![poly_layout],
                wgpu::PrimitiveTopology::TriangleList,
            ),
            PipelineKind::PolygonOutline => (
                &self.polygon_shader,
                vec![poly_layout],
                wgpu::PrimitiveTopology::LineList,
            ),
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn raw_buffer(&self, handle: BufferHandle) -> Result<&wgpu::Buffer> {
        self.buffers
            .get(&handle)
            .and_then(|b| b.raw.as_ref())
            .ok_or(OverlayError::UnknownBuffer(handle))
    }

    fn ensure_uniform_slots(&mut self, count: usize) {
        while self.uniform_slots.len() < count {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("pass uniforms"),
                size: mem::size_of::<PassUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("pass uniforms"),
                layout: &self.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.uniform_slots.push(UniformSlot { buffer, bind_group });
        }
    }

    fn check_in_frame(&self) -> Result<()> {
        if self.in_frame {
            Ok(())
        } else {
            Err(OverlayError::NoActiveFrame)
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        // validation errors surface through the scope rather than a panic
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.build_pipeline(desc.kind, desc.label);
        if let Some(error) = self.device.pop_error_scope().block_on() {
            return Err(OverlayError::PipelineCreation {
                name: desc.label.to_string(),
                reason: error.to_string(),
            });
        }

        let handle = PipelineHandle(self.next_handle());
        self.pipelines.insert(handle, pipeline);
        Ok(handle)
    }

    fn create_buffer(&mut self, label: &str) -> BufferHandle {
        let handle = BufferHandle(self.next_handle());
        self.buffers.insert(
            handle,
            GpuBuffer {
                raw: None,
                capacity: 0,
                label: label.to_string(),
            },
        );
        handle
    }

    fn upload(&mut self, buffer: BufferHandle, bytes: &[u8]) -> Result<()> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(OverlayError::UnknownBuffer(buffer))?;

        if bytes.is_empty() {
            entry.raw = None;
            entry.capacity = 0;
            return Ok(());
        }

        match &entry.raw {
            Some(raw) if entry.capacity >= bytes.len() as u64 => {
                self.queue.write_buffer(raw, 0, bytes);
            }
            _ => {
                let raw = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(entry.label.as_str()),
                        contents: bytes,
                        usage: wgpu::BufferUsages::VERTEX
                            | wgpu::BufferUsages::INDEX
                            | wgpu::BufferUsages::COPY_DST,
                    });
                entry.capacity = bytes.len() as u64;
                entry.raw = Some(raw);
            }
        }
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.pipelines.remove(&pipeline);
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.in_frame = true;
        self.recorded.clear();
        Ok(())
    }

    fn draw_instanced(
        &mut self,
        pipeline: PipelineHandle,
        mesh: BufferHandle,
        instances: BufferHandle,
        uniforms: &PassUniforms,
        vertex_count: u32,
        instance_count: u32,
    ) -> Result<()> {
        self.check_in_frame()?;
        if !self.pipelines.contains_key(&pipeline) {
            return Err(OverlayError::UnknownPipeline(pipeline));
        }
        self.raw_buffer(mesh)?;
        self.raw_buffer(instances)?;
        self.recorded.push(RecordedDraw::Instanced {
            pipeline,
            mesh,
            instances,
            uniforms: *uniforms,
            vertex_count,
            instance_count,
        });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        pipeline: PipelineHandle,
        vertices: BufferHandle,
        indices: BufferHandle,
        uniforms: &PassUniforms,
        index_count: u32,
    ) -> Result<()> {
        self.check_in_frame()?;
        if !self.pipelines.contains_key(&pipeline) {
            return Err(OverlayError::UnknownPipeline(pipeline));
        }
        self.raw_buffer(vertices)?;
        self.raw_buffer(indices)?;
        self.recorded.push(RecordedDraw::Indexed {
            pipeline,
            vertices,
            indices,
            uniforms: *uniforms,
            index_count,
        });
        Ok(())
    }

    fn draw_lines(
        &mut self,
        pipeline: PipelineHandle,
        vertices: BufferHandle,
        uniforms: &PassUniforms,
        vertex_count: u32,
    ) -> Result<()> {
        self.check_in_frame()?;
        if !self.pipelines.contains_key(&pipeline) {
            return Err(OverlayError::UnknownPipeline(pipeline));
        }
        self.raw_buffer(vertices)?;
        self.recorded.push(RecordedDraw::Lines {
            pipeline,
            vertices,
            uniforms: *uniforms,
            vertex_count,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.check_in_frame()?;
        self.in_frame = false;

        let recorded = mem::take(&mut self.recorded);
        self.ensure_uniform_slots(recorded.len());
        for (slot, draw) in self.uniform_slots.iter().zip(&recorded) {
            let uniforms = match draw {
                RecordedDraw::Instanced { uniforms, .. } => uniforms,
                RecordedDraw::Indexed { uniforms, .. } => uniforms,
                RecordedDraw::Lines { uniforms, .. } => uniforms,
            };
            self.queue
                .write_buffer(&slot.buffer, 0, bytemuck::bytes_of(uniforms));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("overlay frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (slot, draw) in self.uniform_slots.iter().zip(&recorded) {
                pass.set_bind_group(0, &slot.bind_group, &[]);
                match draw {
                    RecordedDraw::Instanced {
                        pipeline,
                        mesh,
                        instances,
                        vertex_count,
                        instance_count,
                        ..
                    } => {
                        pass.set_pipeline(&self.pipelines[pipeline]);
                        pass.set_vertex_buffer(0, self.raw_buffer(*mesh)?.slice(..));
                        pass.set_vertex_buffer(1, self.raw_buffer(*instances)?.slice(..));
                        pass.draw(0..*vertex_count, 0..*instance_count);
                    }
                    RecordedDraw::Indexed {
                        pipeline,
                        vertices,
                        indices,
                        index_count,
                        ..
                    } => {
                        pass.set_pipeline(&self.pipelines[pipeline]);
                        pass.set_vertex_buffer(0, self.raw_buffer(*vertices)?.slice(..));
                        pass.set_index_buffer(
                            self.raw_buffer(*indices)?.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        pass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    RecordedDraw::Lines {
                        pipeline,
                        vertices,
                        vertex_count,
                        ..
                    } => {
                        pass.set_pipeline(&self.pipelines[pipeline]);
                        pass.set_vertex_buffer(0, self.raw_buffer(*vertices)?.slice(..));
                        pass.draw(0..*vertex_count, 0..1);
                    }
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
