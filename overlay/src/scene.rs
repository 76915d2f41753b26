//! Data model for one annotation snapshot.
//!
//! Everything here arrives from the outside as a full replacement: the
//! entity feed swaps whole vectors, the ROI tool swaps the selection on
//! every drag update. Nothing in this module is mutated in place.

use glam::Vec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use common::id_type;

use crate::color::Color;
use crate::error::OverlayError;
use crate::geometry::{self, Rect};

id_type!(AnnotationId);

/// ROI-unit to level-0-pixel factor. The drawing tool currently emits
/// level-0 pixels, so the factor is 1; it is still applied at every
/// containment boundary so a unit change stays a one-line edit.
pub const ROI_COORD_SCALE: f32 = 1.0;

/// One detected cell: representative point plus model classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub id: AnnotationId,
    /// Level-0 image pixels.
    pub position: Vec2,
    /// Index into the palette; negative means unclassified.
    pub class_id: i32,
}

/// One contoured cell or region, a closed loop of level-0 pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub id: AnnotationId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Vec2>,
    pub class_id: i32,
}

impl Contour {
    /// Representative point for highlight tests; `None` for loops too
    /// short to render.
    pub fn centroid(&self) -> Option<Vec2> {
        geometry::polygon_centroid(&self.points)
    }
}

/// Ordered class-to-color mapping owned by the classification state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassPalette {
    colors: Vec<Color>,
}

impl ClassPalette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    pub fn from_hex<'a, I>(hex: I) -> Result<Self, OverlayError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let colors = hex
            .into_iter()
            .map(Color::from_hex)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { colors })
    }

    pub fn color_for(&self, class_id: i32) -> Option<Color> {
        if class_id < 0 {
            return None;
        }
        self.colors.get(class_id as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// User-forced colors, id to color.
pub type OverrideMap = HashMap<AnnotationId, Color>;

/// Current selection, replaced on every interactive update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Roi {
    Rect(Rect),
    Polygon(Vec<Vec2>),
}

impl Roi {
    /// Containment of a level-0 pixel point. ROI coordinates carry their
    /// own unit and are brought to image scale first; for polygon loops
    /// the probe is divided instead, which avoids rescaling the whole
    /// loop per entity.
    pub fn contains(&self, image_point: Vec2) -> bool {
        match self {
            Roi::Rect(rect) => rect.scaled(ROI_COORD_SCALE).contains(image_point),
            Roi::Polygon(points) => {
                geometry::point_in_polygon(image_point / ROI_COORD_SCALE, points)
            }
        }
    }

    /// Image-space bounding box, used to cheaply reject entities before
    /// the exact test. Degenerate selections (mid-drag zero-size rect,
    /// short loop) fall back to a visible placeholder box so the box is
    /// conservative, never empty.
    pub fn bounding_rect(&self) -> Rect {
        let raw = match self {
            Roi::Rect(rect) => Some(*rect),
            Roi::Polygon(points) => geometry::bounding_rect(points),
        };
        match raw {
            Some(rect) if !rect.is_degenerate() => rect.scaled(ROI_COORD_SCALE),
            Some(rect) => Rect::placeholder(rect.center() * ROI_COORD_SCALE),
            None => Rect::placeholder(Vec2::ZERO),
        }
    }
}

/// Full input state of the renderer at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub centroids: Vec<Centroid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contours: Vec<Contour>,
    #[serde(default)]
    pub palette: ClassPalette,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub overrides: OverrideMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<Roi>,
}
