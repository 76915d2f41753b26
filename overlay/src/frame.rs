//! Conversion of one scene snapshot into GPU-ready buffer sets.
//!
//! Three passes come out of here: centroid instances over a shared
//! unit-circle mesh, an indexed triangle list for contour fills, and a
//! line list outlining the contours caught by the ROI. Building never
//! touches the GPU; identical snapshots produce identical buffers.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::geometry;
use crate::scene::SceneSnapshot;
use crate::style::{StyleResolver, HIGHLIGHT_ALPHA, HIGHLIGHT_COLOR};

/// Segment count of the shared unit-circle instance mesh.
pub const CIRCLE_SEGMENTS: u32 = 16;

/// Per-centroid instance data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CentroidInstance {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Vertex of the fill and outline passes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PolyVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Flat per-pass arrays, rebuilt wholesale on every data change and
/// owned by the controller until the next rebuild replaces them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffers {
    pub instances: Vec<CentroidInstance>,
    pub fill_vertices: Vec<PolyVertex>,
    pub fill_indices: Vec<u32>,
    pub outline_vertices: Vec<PolyVertex>,
}

impl FrameBuffers {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.fill_indices.is_empty() && self.outline_vertices.is_empty()
    }
}

pub fn build_frame_buffers(scene: &SceneSnapshot) -> FrameBuffers {
    let style = StyleResolver::for_scene(scene);
    let mut buffers = FrameBuffers::default();

    buffers.instances.reserve(scene.centroids.len());
    for centroid in &scene.centroids {
        let color = style.resolve(centroid.id, centroid.class_id, centroid.position);
        buffers.instances.push(CentroidInstance {
            position: centroid.position.to_array(),
            color: color.to_array(),
        });
    }

    for contour in &scene.contours {
        let Some(centroid) = contour.centroid() else {
            // loops below 3 points never reach the GPU
            continue;
        };
        let color = style
            .resolve(contour.id, contour.class_id, centroid)
            .to_array();

        let base = buffers.fill_vertices.len() as u32;
        buffers
            .fill_vertices
            .extend(contour.points.iter().map(|p| PolyVertex {
                position: p.to_array(),
                color,
            }));
        geometry::triangulate_fan(base, contour.points.len(), &mut buffers.fill_indices);

        if style.is_highlighted(centroid) {
            push_outline(&mut buffers.outline_vertices, &contour.points);
        }
    }

    buffers
}

/// Line list over the loop edges, closing edge included: two vertices
/// per point.
fn push_outline(out: &mut Vec<PolyVertex>, points: &[Vec2]) {
    let color = HIGHLIGHT_COLOR.with_alpha(HIGHLIGHT_ALPHA).to_array();
    out.reserve(points.len() * 2);
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        out.push(PolyVertex {
            position: a.to_array(),
            color,
        });
        out.push(PolyVertex {
            position: b.to_array(),
            color,
        });
    }
}
