//! Viewer camera snapshot and the per-frame image-to-canvas transform.
//!
//! The viewer works in normalized viewport units: the image spans
//! `[0, 1]` horizontally and `[0, aspect]` vertically, where
//! `aspect = content_h / content_w`. `zoom` is the number of viewport
//! units visible across the container width, inverted (zoom 1 shows the
//! whole image width).

use glam::{Mat3, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub zoom: f32,
    /// Viewport-unit point at the middle of the container.
    pub center: Vec2,
    pub rotation_degrees: f32,
    /// Horizontal mirror of the whole canvas.
    pub flipped: bool,
    /// Container size in logical pixels.
    pub container_size: Vec2,
    pub margins: Margins,
    /// Level-0 image size in pixels.
    pub content_size: Vec2,
    pub device_pixel_ratio: f32,
}

impl CameraState {
    /// Whole image width visible, centered, unrotated.
    pub fn home(content_size: Vec2, container_size: Vec2) -> Self {
        let aspect = content_size.y / content_size.x;
        Self {
            zoom: 1.0,
            center: Vec2::new(0.5, aspect * 0.5),
            rotation_degrees: 0.0,
            flipped: false,
            container_size,
            margins: Margins::default(),
            content_size,
            device_pixel_ratio: 1.0,
        }
    }

    /// Physical canvas size in device pixels.
    pub fn canvas_size(&self) -> Vec2 {
        self.container_size * self.device_pixel_ratio
    }

    /// Visible viewport-unit region as (top_left, size).
    pub fn viewport_bounds(&self) -> (Vec2, Vec2) {
        let width = 1.0 / self.zoom;
        let height = width * self.container_size.y / self.container_size.x;
        let size = Vec2::new(width, height);
        (self.center - size * 0.5, size)
    }

    /// Compose the level-0-pixel to device-pixel matrix for this snapshot.
    ///
    /// Recomputed every frame; returns `None` for degenerate snapshots
    /// (zero-sized content or container, non-finite pose) so callers skip
    /// the frame instead of propagating NaN through the vertex stream.
    pub fn view_transform(&self) -> Option<Mat3> {
        if !self.is_renderable() {
            return None;
        }

        let content = self.content_size;
        let aspect = content.y / content.x;

        // image px -> viewport units, y divided out by height then put on
        // the x-normalized scale
        let mut m = Mat3::from_scale(Vec2::new(1.0 / content.x, aspect / content.y));

        if self.rotation_degrees != 0.0 {
            m = rotation_about(self.center, self.rotation_degrees) * m;
        }

        let (top_left, bounds) = self.viewport_bounds();
        let pixels_per_unit = self.container_size.x / bounds.x;
        m = Mat3::from_translation(Vec2::new(self.margins.left, self.margins.top))
            * Mat3::from_scale(Vec2::splat(pixels_per_unit))
            * Mat3::from_translation(-top_left)
            * m;

        if self.device_pixel_ratio != 1.0 {
            m = Mat3::from_scale(Vec2::splat(self.device_pixel_ratio)) * m;
        }

        if self.flipped {
            m = flip_horizontal(self.canvas_size().x) * m;
        }

        Some(m)
    }

    fn is_renderable(&self) -> bool {
        self.zoom.is_finite()
            && self.zoom > 0.0
            && self.center.is_finite()
            && self.rotation_degrees.is_finite()
            && self.container_size.is_finite()
            && self.container_size.x > 0.0
            && self.container_size.y > 0.0
            && self.content_size.is_finite()
            && self.content_size.x > 0.0
            && self.content_size.y > 0.0
            && self.margins.left.is_finite()
            && self.margins.top.is_finite()
            && self.device_pixel_ratio.is_finite()
            && self.device_pixel_ratio > 0.0
    }
}

/// Rotation by `degrees` around an arbitrary center.
pub fn rotation_about(center: Vec2, degrees: f32) -> Mat3 {
    Mat3::from_translation(center)
        * Mat3::from_angle(degrees.to_radians())
        * Mat3::from_translation(-center)
}

/// Mirror x across a canvas of the given width: negate the x terms and
/// translate back by the canvas width.
fn flip_horizontal(canvas_width: f32) -> Mat3 {
    Mat3::from_translation(Vec2::new(canvas_width, 0.0)) * Mat3::from_scale(Vec2::new(-1.0, 1.0))
}
