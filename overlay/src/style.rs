//! Per-entity color resolution.
//!
//! Priority, highest first: ROI highlight, manual override, palette
//! class color, neutral fallback. Alpha depends only on highlight state.

use glam::Vec2;

use crate::color::Color;
use crate::geometry::Rect;
use crate::scene::{AnnotationId, ClassPalette, OverrideMap, Roi, SceneSnapshot};

pub const BASE_ALPHA: f32 = 0.6;
pub const HIGHLIGHT_ALPHA: f32 = 0.8;

pub const HIGHLIGHT_COLOR: Color = Color::rgb(1.0, 0.84, 0.0);
pub const UNCLASSIFIED_COLOR: Color = Color::rgb(0.6, 0.6, 0.6);

/// Borrows the style inputs of one snapshot and resolves entities against
/// them. Stateless: identical inputs resolve identically on every call.
pub struct StyleResolver<'a> {
    palette: &'a ClassPalette,
    overrides: &'a OverrideMap,
    roi: Option<&'a Roi>,
    /// Conservative image-space box around the ROI, tested before the
    /// exact containment to keep the per-entity cost low.
    roi_bounds: Option<Rect>,
}

impl<'a> StyleResolver<'a> {
    pub fn new(
        palette: &'a ClassPalette,
        overrides: &'a OverrideMap,
        roi: Option<&'a Roi>,
    ) -> Self {
        Self {
            palette,
            overrides,
            roi,
            roi_bounds: roi.map(Roi::bounding_rect),
        }
    }

    pub fn for_scene(scene: &'a SceneSnapshot) -> Self {
        Self::new(&scene.palette, &scene.overrides, scene.roi.as_ref())
    }

    pub fn is_highlighted(&self, probe: Vec2) -> bool {
        match (self.roi, &self.roi_bounds) {
            (Some(roi), Some(bounds)) => bounds.contains(probe) && roi.contains(probe),
            _ => false,
        }
    }

    /// Resolve the final RGBA for an entity given its id, class and
    /// representative point.
    pub fn resolve(&self, id: AnnotationId, class_id: i32, probe: Vec2) -> Color {
        if self.is_highlighted(probe) {
            return HIGHLIGHT_COLOR.with_alpha(HIGHLIGHT_ALPHA);
        }
        self.overrides
            .get(&id)
            .copied()
            .or_else(|| self.palette.color_for(class_id))
            .unwrap_or(UNCLASSIFIED_COLOR)
            .with_alpha(BASE_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ROI_COORD_SCALE;

    fn palette() -> ClassPalette {
        ClassPalette::new(vec![Color::RED, Color::BLUE])
    }

    #[test]
    fn palette_color_with_base_alpha() {
        let overrides = OverrideMap::new();
        let palette = palette();
        let resolver = StyleResolver::new(&palette, &overrides, None);
        let c = resolver.resolve(AnnotationId::from_u128(1), 0, Vec2::ZERO);
        assert_eq!(c, Color::RED.with_alpha(BASE_ALPHA));
    }

    #[test]
    fn unknown_class_falls_back_to_gray() {
        let overrides = OverrideMap::new();
        let palette = palette();
        let resolver = StyleResolver::new(&palette, &overrides, None);
        let c = resolver.resolve(AnnotationId::from_u128(1), -1, Vec2::ZERO);
        assert_eq!(c, UNCLASSIFIED_COLOR.with_alpha(BASE_ALPHA));
        let c = resolver.resolve(AnnotationId::from_u128(1), 99, Vec2::ZERO);
        assert_eq!(c, UNCLASSIFIED_COLOR.with_alpha(BASE_ALPHA));
    }

    #[test]
    fn override_beats_palette() {
        let id = AnnotationId::from_u128(1);
        let mut overrides = OverrideMap::new();
        overrides.insert(id, Color::GREEN);
        let palette = palette();
        let resolver = StyleResolver::new(&palette, &overrides, None);
        let c = resolver.resolve(id, 0, Vec2::ZERO);
        assert_eq!(c, Color::GREEN.with_alpha(BASE_ALPHA));
    }

    #[test]
    fn highlight_beats_override_and_palette() {
        let id = AnnotationId::from_u128(1);
        let mut overrides = OverrideMap::new();
        overrides.insert(id, Color::GREEN);
        let roi = Roi::Rect(Rect::from_corners(Vec2::ZERO, Vec2::new(100.0, 100.0)));
        let palette = palette();
        let resolver = StyleResolver::new(&palette, &overrides, Some(&roi));

        let inside = Vec2::new(50.0, 50.0) * ROI_COORD_SCALE;
        assert_eq!(
            resolver.resolve(id, 0, inside),
            HIGHLIGHT_COLOR.with_alpha(HIGHLIGHT_ALPHA)
        );

        // outside the ROI the override shows again
        let outside = Vec2::new(500.0, 500.0);
        assert_eq!(
            resolver.resolve(id, 0, outside),
            Color::GREEN.with_alpha(BASE_ALPHA)
        );
    }

    #[test]
    fn alpha_range_is_bounded() {
        assert!((0.6..=0.9).contains(&BASE_ALPHA));
        assert!((0.6..=0.9).contains(&HIGHLIGHT_ALPHA));
        assert!(HIGHLIGHT_ALPHA > BASE_ALPHA);
    }
}
