#![allow(dead_code)]

pub mod camera;
pub mod color;
pub mod controller;
pub mod device;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod scene;
pub mod software;
pub mod style;
pub mod wgpu_device;

#[cfg(test)]
mod tests;

pub use crate::camera::{CameraState, Margins};
pub use crate::color::Color;
pub use crate::controller::OverlayController;
pub use crate::device::{GraphicsDevice, PassUniforms, PipelineKind};
pub use crate::error::{OverlayError, Result};
pub use crate::frame::{build_frame_buffers, FrameBuffers};
pub use crate::scene::{
    AnnotationId, Centroid, ClassPalette, Contour, OverrideMap, Roi, SceneSnapshot,
};
pub use crate::software::SoftwareDevice;
pub use crate::style::StyleResolver;
pub use crate::wgpu_device::WgpuDevice;
