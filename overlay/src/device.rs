//! Backend-agnostic graphics device interface.
//!
//! The transform, style and buffer-building stages are pure; everything
//! that touches a GPU goes through this trait so the pipeline can run
//! against real hardware or the recording backend in [`crate::software`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec2};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub(crate) u32);

/// The three fixed render passes of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Unit-circle mesh instanced once per centroid.
    CentroidInstanced,
    /// Indexed triangle list over concatenated contour vertices.
    PolygonFill,
    /// Line list over highlighted contour edges.
    PolygonOutline,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc<'a> {
    pub kind: PipelineKind,
    pub label: &'a str,
}

/// Uniform block shared by every pass and backend.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PassUniforms {
    /// Image px to canvas px, mat3 widened to mat4 columns for shader
    /// alignment.
    pub transform: [[f32; 4]; 4],
    /// Physical canvas size in device pixels.
    pub viewport: [f32; 2],
    /// Centroid radius in device pixels.
    pub point_size: f32,
    pub _pad: f32,
}

impl PassUniforms {
    pub fn new(transform: &Mat3, viewport: Vec2, point_size: f32) -> Self {
        Self {
            transform: widen_mat3(transform),
            viewport: viewport.to_array(),
            point_size,
            _pad: 0.0,
        }
    }
}

fn widen_mat3(m: &Mat3) -> [[f32; 4]; 4] {
    [
        [m.x_axis.x, m.x_axis.y, 0.0, 0.0],
        [m.y_axis.x, m.y_axis.y, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [m.z_axis.x, m.z_axis.y, 0.0, 1.0],
    ]
}

/// Minimal device surface the overlay needs: resource creation, uploads,
/// and the three draw verbs bracketed by a frame.
///
/// Setup-time failures (`create_pipeline`) are fatal for the mount;
/// per-frame failures abort only the offending pass.
pub trait GraphicsDevice {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle>;
    fn create_buffer(&mut self, label: &str) -> BufferHandle;
    fn upload(&mut self, buffer: BufferHandle, bytes: &[u8]) -> Result<()>;
    fn destroy_buffer(&mut self, buffer: BufferHandle);
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    fn begin_frame(&mut self) -> Result<()>;
    #[allow(clippy::too_many_arguments)]
    fn draw_instanced(
        &mut self,
        pipeline: PipelineHandle,
        mesh: BufferHandle,
        instances: BufferHandle,
        uniforms: &PassUniforms,
        vertex_count: u32,
        instance_count: u32,
    ) -> Result<()>;
    fn draw_indexed(
        &mut self,
        pipeline: PipelineHandle,
        vertices: BufferHandle,
        indices: BufferHandle,
        uniforms: &PassUniforms,
        index_count: u32,
    ) -> Result<()>;
    fn draw_lines(
        &mut self,
        pipeline: PipelineHandle,
        vertices: BufferHandle,
        uniforms: &PassUniforms,
        vertex_count: u32,
    ) -> Result<()>;
    fn end_frame(&mut self) -> Result<()>;
}
