//! Frame orchestration and GPU resource ownership.
//!
//! Two entry points drive everything: `on_camera_changed` redraws from
//! the cached buffers, `on_data_changed` rebuilds and re-uploads them
//! first. Both run to completion on the caller's thread; there is no
//! queue and no re-entrancy.

use log::{debug, warn};

use crate::camera::CameraState;
use crate::device::{
    BufferHandle, GraphicsDevice, PassUniforms, PipelineDesc, PipelineHandle, PipelineKind,
};
use crate::error::Result;
use crate::frame::{self, FrameBuffers, CIRCLE_SEGMENTS};
use crate::geometry;
use crate::scene::SceneSnapshot;

pub const POINT_SIZE_FLOOR: f32 = 1.5;
pub const POINT_SIZE_BASE: f32 = 6.0;
pub const POINT_SIZE_LOG_GAIN: f32 = 2.0;
pub const ZOOM_EPSILON: f32 = 1e-3;

/// Centroid radius in device pixels for a zoom level. Grows with the log
/// of zoom and is clamped to a floor so points stay visible at extreme
/// zoom-out.
pub fn point_size_for_zoom(zoom: f32) -> f32 {
    let size = POINT_SIZE_BASE + POINT_SIZE_LOG_GAIN * zoom.max(ZOOM_EPSILON).ln();
    size.max(POINT_SIZE_FLOOR)
}

struct Pipelines {
    centroid: PipelineHandle,
    fill: PipelineHandle,
    outline: PipelineHandle,
}

struct Buffers {
    circle_mesh: BufferHandle,
    instances: BufferHandle,
    fill_vertices: BufferHandle,
    fill_indices: BufferHandle,
    outline_vertices: BufferHandle,
}

/// Owns the device and every GPU resource of one mounted overlay.
pub struct OverlayController<D: GraphicsDevice> {
    device: D,
    pipelines: Pipelines,
    buffers: Buffers,
    frame: FrameBuffers,
    camera: Option<CameraState>,
    circle_vertex_count: u32,
}

impl<D: GraphicsDevice> OverlayController<D> {
    /// Compile pipelines, create buffers and upload the shared circle
    /// mesh. Any failure here is fatal for the mount and leaves the
    /// overlay blank.
    pub fn new(mut device: D) -> Result<Self> {
        let pipelines = Pipelines {
            centroid: device.create_pipeline(&PipelineDesc {
                kind: PipelineKind::CentroidInstanced,
                label: "centroid instanced",
            })?,
            fill: device.create_pipeline(&PipelineDesc {
                kind: PipelineKind::PolygonFill,
                label: "contour fill",
            })?,
            outline: device.create_pipeline(&PipelineDesc {
                kind: PipelineKind::PolygonOutline,
                label: "contour outline",
            })?,
        };
        let buffers = Buffers {
            circle_mesh: device.create_buffer("unit circle mesh"),
            instances: device.create_buffer("centroid instances"),
            fill_vertices: device.create_buffer("contour fill vertices"),
            fill_indices: device.create_buffer("contour fill indices"),
            outline_vertices: device.create_buffer("contour outline vertices"),
        };

        let mesh = geometry::unit_circle_mesh(CIRCLE_SEGMENTS);
        device.upload(buffers.circle_mesh, bytemuck::cast_slice(&mesh))?;

        Ok(Self {
            device,
            pipelines,
            buffers,
            frame: FrameBuffers::default(),
            camera: None,
            circle_vertex_count: mesh.len() as u32,
        })
    }

    /// New entity/palette/override/ROI snapshot: rebuild the frame
    /// buffers, push them to the GPU, redraw.
    pub fn on_data_changed(&mut self, scene: &SceneSnapshot) -> Result<()> {
        self.frame = frame::build_frame_buffers(scene);
        self.device.upload(
            self.buffers.instances,
            bytemuck::cast_slice(&self.frame.instances),
        )?;
        self.device.upload(
            self.buffers.fill_vertices,
            bytemuck::cast_slice(&self.frame.fill_vertices),
        )?;
        self.device.upload(
            self.buffers.fill_indices,
            bytemuck::cast_slice(&self.frame.fill_indices),
        )?;
        self.device.upload(
            self.buffers.outline_vertices,
            bytemuck::cast_slice(&self.frame.outline_vertices),
        )?;
        self.redraw()
    }

    /// New camera pose: redraw from the cached buffers, nothing is
    /// rebuilt or re-uploaded.
    pub fn on_camera_changed(&mut self, camera: CameraState) -> Result<()> {
        self.camera = Some(camera);
        self.redraw()
    }

    pub fn redraw(&mut self) -> Result<()> {
        let Some(camera) = self.camera else {
            debug!("redraw before first camera snapshot, skipping");
            return Ok(());
        };
        let Some(transform) = camera.view_transform() else {
            debug!("degenerate camera snapshot, skipping frame");
            return Ok(());
        };

        let uniforms = PassUniforms::new(
            &transform,
            camera.canvas_size(),
            point_size_for_zoom(camera.zoom),
        );

        self.device.begin_frame()?;

        if !self.frame.instances.is_empty() {
            if let Err(err) = self.device.draw_instanced(
                self.pipelines.centroid,
                self.buffers.circle_mesh,
                self.buffers.instances,
                &uniforms,
                self.circle_vertex_count,
                self.frame.instances.len() as u32,
            ) {
                warn!("centroid pass skipped: {err}");
            }
        }

        if !self.frame.fill_indices.is_empty() {
            if let Err(err) = self.device.draw_indexed(
                self.pipelines.fill,
                self.buffers.fill_vertices,
                self.buffers.fill_indices,
                &uniforms,
                self.frame.fill_indices.len() as u32,
            ) {
                warn!("contour fill pass skipped: {err}");
            }
        }

        if !self.frame.outline_vertices.is_empty() {
            if let Err(err) = self.device.draw_lines(
                self.pipelines.outline,
                self.buffers.outline_vertices,
                &uniforms,
                self.frame.outline_vertices.len() as u32,
            ) {
                warn!("contour outline pass skipped: {err}");
            }
        }

        self.device.end_frame()
    }

    pub fn frame_buffers(&self) -> &FrameBuffers {
        &self.frame
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: GraphicsDevice> Drop for OverlayController<D> {
    fn drop(&mut self) {
        // GPU contexts are a bounded external resource; hand everything
        // back before the device itself goes
        self.device.destroy_buffer(self.buffers.circle_mesh);
        self.device.destroy_buffer(self.buffers.instances);
        self.device.destroy_buffer(self.buffers.fill_vertices);
        self.device.destroy_buffer(self.buffers.fill_indices);
        self.device.destroy_buffer(self.buffers.outline_vertices);
        self.device.destroy_pipeline(self.pipelines.centroid);
        self.device.destroy_pipeline(self.pipelines.fill);
        self.device.destroy_pipeline(self.pipelines.outline);
    }
}
