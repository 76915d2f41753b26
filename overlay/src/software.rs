//! Recording graphics device.
//!
//! Stores uploads and draw calls instead of touching a GPU. Used as the
//! unit-test backend and as a reference for what a frame would submit.

use std::collections::HashMap;

use crate::device::{
    BufferHandle, GraphicsDevice, PassUniforms, PipelineDesc, PipelineHandle, PipelineKind,
};
use crate::error::{OverlayError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Instanced {
        pipeline: PipelineKind,
        vertex_count: u32,
        instance_count: u32,
        uniforms: PassUniforms,
    },
    Indexed {
        pipeline: PipelineKind,
        index_count: u32,
        uniforms: PassUniforms,
    },
    Lines {
        pipeline: PipelineKind,
        vertex_count: u32,
        uniforms: PassUniforms,
    },
}

#[derive(Debug, Default)]
pub struct SoftwareDevice {
    next_handle: u32,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    pipelines: HashMap<PipelineHandle, PipelineKind>,
    in_frame: bool,
    current: Vec<DrawCall>,
    /// One entry per completed begin/end bracket.
    pub frames: Vec<Vec<DrawCall>>,
}

impl SoftwareDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_bytes(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn last_frame(&self) -> Option<&[DrawCall]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn pipeline_kind(&self, pipeline: PipelineHandle) -> Result<PipelineKind> {
        self.pipelines
            .get(&pipeline)
            .copied()
            .ok_or(OverlayError::UnknownPipeline(pipeline))
    }

    fn check_buffer(&self, buffer: BufferHandle) -> Result<()> {
        if self.buffers.contains_key(&buffer) {
            Ok(())
        } else {
            Err(OverlayError::UnknownBuffer(buffer))
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

impl GraphicsDevice for SoftwareDevice {
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        let handle = PipelineHandle(self.next_handle);
        self.next_handle += 1;
        self.pipelines.insert(handle, desc.kind);
        Ok(handle)
    }

    fn create_buffer(&mut self, _label: &str) -> BufferHandle {
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        self.buffers.insert(handle, Vec::new());
        handle
    }

    fn upload(&mut self, buffer: BufferHandle, bytes: &[u8]) -> Result<()> {
        let slot = self
            .buffers
            .get_mut(&buffer)
            .ok_or(OverlayError::UnknownBuffer(buffer))?;
        slot.clear();
        slot.extend_from_slice(bytes);
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
        self.current.clear();
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
        self.check_buffer(mesh)?;
        self.check_buffer(instances)?;
        let pipeline = self.pipeline_kind(pipeline)?;
        self.current.push(DrawCall::Instanced {
            pipeline,
            vertex_count,
            instance_count,
            uniforms: *uniforms,
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
        self.check_buffer(vertices)?;
        self.check_buffer(indices)?;
        let pipeline = self.pipeline_kind(pipeline)?;
        self.current.push(DrawCall::Indexed {
            pipeline,
            index_count,
            uniforms: *uniforms,
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
        self.check_buffer(vertices)?;
        let pipeline = self.pipeline_kind(pipeline)?;
        self.current.push(DrawCall::Lines {
            pipeline,
            vertex_count,
            uniforms: *uniforms,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.check_in_frame()?;
        self.in_frame = false;
        self.frames.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat3, Vec2};

    fn uniforms() -> PassUniforms {
        PassUniforms::new(&Mat3::IDENTITY, Vec2::new(800.0, 600.0), 4.0)
    }

    #[test]
    fn records_a_frame() -> anyhow::Result<()> {
        let mut device = SoftwareDevice::new();
        let pipeline = device.create_pipeline(&PipelineDesc {
            kind: PipelineKind::PolygonFill,
            label: "fill",
        })?;
        let vertices = device.create_buffer("vertices");
        let indices = device.create_buffer("indices");
        device.upload(vertices, &[0u8; 24])?;
        device.upload(indices, &[0u8; 12])?;

        device.begin_frame()?;
        device.draw_indexed(pipeline, vertices, indices, &uniforms(), 3)?;
        device.end_frame()?;

        assert_eq!(device.frames.len(), 1);
        assert!(matches!(
            device.last_frame().unwrap()[0],
            DrawCall::Indexed {
                pipeline: PipelineKind::PolygonFill,
                index_count: 3,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn draw_outside_frame_is_rejected() {
        let mut device = SoftwareDevice::new();
        let pipeline = device
            .create_pipeline(&PipelineDesc {
                kind: PipelineKind::PolygonOutline,
                label: "outline",
            })
            .unwrap();
        let vertices = device.create_buffer("vertices");
        let err = device.draw_lines(pipeline, vertices, &uniforms(), 2);
        assert!(matches!(err, Err(OverlayError::NoActiveFrame)));
    }

    #[test]
    fn destroyed_buffer_fails_the_pass() {
        let mut device = SoftwareDevice::new();
        let pipeline = device
            .create_pipeline(&PipelineDesc {
                kind: PipelineKind::PolygonOutline,
                label: "outline",
            })
            .unwrap();
        let vertices = device.create_buffer("vertices");
        device.destroy_buffer(vertices);

        device.begin_frame().unwrap();
        let err = device.draw_lines(pipeline, vertices, &uniforms(), 2);
        assert!(matches!(err, Err(OverlayError::UnknownBuffer(_))));
    }

    #[test]
    fn upload_replaces_contents() -> anyhow::Result<()> {
        let mut device = SoftwareDevice::new();
        let buffer = device.create_buffer("b");
        device.upload(buffer, &[1, 2, 3, 4])?;
        device.upload(buffer, &[9, 9])?;
        assert_eq!(device.buffer_bytes(buffer), Some(&[9u8, 9][..]));
        Ok(())
    }
}
