//! RGBA color type for overlay styling.

use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// RGBA color with f32 components in range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`, leading `#` optional.
    pub fn from_hex(hex: &str) -> Result<Self, OverlayError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let invalid = || OverlayError::InvalidHexColor(hex.to_string());

        let byte_at = |index: usize| -> Result<u8, OverlayError> {
            let pair = digits
                .get(index * 2..index * 2 + 2)
                .ok_or_else(|| invalid())?;
            u8::from_str_radix(pair, 16).map_err(|_| invalid())
        };

        match digits.len() {
            6 => Ok(Self::from_u8(byte_at(0)?, byte_at(1)?, byte_at(2)?, 255)),
            8 => Ok(Self::from_u8(
                byte_at(0)?,
                byte_at(1)?,
                byte_at(2)?,
                byte_at(3)?,
            )),
            _ => Err(invalid()),
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
}

impl From<[f32; 4]> for Color {
    fn from(arr: [f32; 4]) -> Self {
        Self {
            r: arr[0],
            g: arr[1],
            b: arr[2],
            a: arr[3],
        }
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}
