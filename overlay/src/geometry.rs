//! Containment tests and mesh construction for overlay geometry.
//!
//! All coordinates are level-0 image pixels unless a caller scales them
//! first. Polygon loops are ordered point lists; loops with fewer than 3
//! points are rejected by every operation that needs an area.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Half extent of the placeholder box substituted for degenerate input.
pub const PLACEHOLDER_HALF_EXTENT: f32 = 16.0;

/// Axis-aligned rectangle, `min` is the top-left corner in image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Build from two arbitrary opposite corners.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            min: self.min * factor,
            max: self.max * factor,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        !(self.min.is_finite() && self.max.is_finite()) || size.x <= 0.0 || size.y <= 0.0
    }

    /// Fixed-size box around `center`, used when a caller needs a visible
    /// region but the real one collapsed to nothing.
    pub fn placeholder(center: Vec2) -> Self {
        let half = Vec2::splat(PLACEHOLDER_HALF_EXTENT);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

pub fn point_in_rect(p: Vec2, rect: &Rect) -> bool {
    rect.contains(p)
}

/// Ray-casting parity test. Boundary points follow the usual half-open
/// edge rule and may land on either side.
pub fn point_in_polygon(p: Vec2, points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Append fan indices `(base, base+i, base+i+1)` for a loop of
/// `point_count` vertices already pushed at offset `base`.
///
/// Assumes a simple, ideally convex loop; concave or self-intersecting
/// input produces wrong triangles but never panics.
pub fn triangulate_fan(base: u32, point_count: usize, indices: &mut Vec<u32>) {
    if point_count < 3 {
        return;
    }
    for i in 1..point_count as u32 - 1 {
        indices.push(base);
        indices.push(base + i);
        indices.push(base + i + 1);
    }
}

/// Triangle list covering the unit circle: `segments` triangles
/// (center, p_i, p_i+1). Built once per renderer lifetime and shared by
/// every centroid instance.
pub fn unit_circle_mesh(segments: u32) -> Vec<[f32; 2]> {
    let mut vertices = Vec::with_capacity(segments as usize * 3);
    for i in 0..segments {
        let a0 = i as f32 / segments as f32 * TAU;
        let a1 = (i + 1) as f32 / segments as f32 * TAU;
        vertices.push([0.0, 0.0]);
        vertices.push([a0.cos(), a0.sin()]);
        vertices.push([a1.cos(), a1.sin()]);
    }
    vertices
}

/// Vertex average, the representative point used for highlight tests.
pub fn polygon_centroid(points: &[Vec2]) -> Option<Vec2> {
    if points.len() < 3 {
        return None;
    }
    let sum = points.iter().copied().fold(Vec2::ZERO, |acc, p| acc + p);
    Some(sum / points.len() as f32)
}

pub fn bounding_rect(points: &[Vec2]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    let mut min = *first;
    let mut max = *first;
    for p in rest {
        min = min.min(*p);
        max = max.max(*p);
    }
    Some(Rect { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_inclusive() {
        let rect = Rect::from_corners(Vec2::ZERO, Vec2::new(100.0, 100.0));
        assert!(point_in_rect(Vec2::new(50.0, 50.0), &rect));
        assert!(point_in_rect(Vec2::ZERO, &rect));
        assert!(point_in_rect(Vec2::new(100.0, 100.0), &rect));
        assert!(!point_in_rect(Vec2::new(100.1, 50.0), &rect));
        assert!(!point_in_rect(Vec2::new(200.0, 200.0), &rect));
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let rect = Rect::from_corners(Vec2::new(10.0, 20.0), Vec2::new(-5.0, 5.0));
        assert_eq!(rect.min, Vec2::new(-5.0, 5.0));
        assert_eq!(rect.max, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn polygon_containment() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Vec2::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(Vec2::new(-1.0, 5.0), &square));
    }

    #[test]
    fn polygon_containment_concave() {
        // L-shape: the notch at the top right is outside
        let l_shape = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(point_in_polygon(Vec2::new(1.0, 1.0), &l_shape));
        assert!(point_in_polygon(Vec2::new(1.0, 3.0), &l_shape));
        assert!(!point_in_polygon(Vec2::new(3.0, 3.0), &l_shape));
    }

    #[test]
    fn short_loops_are_never_contained() {
        let segment = [Vec2::ZERO, Vec2::new(10.0, 10.0)];
        assert!(!point_in_polygon(Vec2::new(5.0, 5.0), &segment));
        assert!(!point_in_polygon(Vec2::ZERO, &[]));
    }

    #[test]
    fn fan_emits_three_indices_per_triangle() {
        for n in 3..12 {
            let mut indices = Vec::new();
            triangulate_fan(0, n, &mut indices);
            assert_eq!(indices.len(), 3 * (n - 2));
        }
    }

    #[test]
    fn fan_respects_base_offset() {
        let mut indices = Vec::new();
        triangulate_fan(7, 4, &mut indices);
        assert_eq!(indices, vec![7, 8, 9, 7, 9, 10]);
    }

    #[test]
    fn fan_skips_degenerate_loops() {
        let mut indices = Vec::new();
        triangulate_fan(0, 2, &mut indices);
        triangulate_fan(0, 0, &mut indices);
        assert!(indices.is_empty());
    }

    #[test]
    fn circle_mesh_size_and_radius() {
        let mesh = unit_circle_mesh(16);
        assert_eq!(mesh.len(), 48);
        for chunk in mesh.chunks(3) {
            assert_eq!(chunk[0], [0.0, 0.0]);
            for v in &chunk[1..] {
                let r = (v[0] * v[0] + v[1] * v[1]).sqrt();
                assert!((r - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn centroid_of_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert_eq!(polygon_centroid(&square), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(polygon_centroid(&square[..2]), None);
    }

    #[test]
    fn bounding_rect_spans_all_points() {
        let points = [
            Vec2::new(3.0, -1.0),
            Vec2::new(-2.0, 4.0),
            Vec2::new(1.0, 1.0),
        ];
        let rect = bounding_rect(&points).unwrap();
        assert_eq!(rect.min, Vec2::new(-2.0, -1.0));
        assert_eq!(rect.max, Vec2::new(3.0, 4.0));
        assert!(bounding_rect(&[]).is_none());
    }

    #[test]
    fn placeholder_is_centered_and_visible() {
        let rect = Rect::placeholder(Vec2::new(100.0, 100.0));
        assert_eq!(rect.center(), Vec2::new(100.0, 100.0));
        assert!(!rect.is_degenerate());
    }
}
