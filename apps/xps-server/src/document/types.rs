//! Document types
//!
//! Backend-neutral values produced and consumed by [`DocumentHandle`](super::DocumentHandle).

use serde::{Deserialize, Serialize};

/// Rectangle locating one occurrence of a search string on a page.
///
/// Page space: origin at the top-left corner, y grows downward, units are
/// points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextInstance {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl TextInstance {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Insertion point for replacement text (top-left corner)
    pub fn anchor(&self) -> (f32, f32) {
        (self.x0, self.y0)
    }

    /// True when the two rectangles share a non-empty area
    pub fn intersects(&self, other: &TextInstance) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

/// Rasterized page: tightly packed RGB samples, row-major
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<u8>,
}

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl TextColor {
    pub const BLACK: TextColor = TextColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
}

/// Styling for inserted text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in points
    pub font_size: f32,
    pub color: TextColor,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            color: TextColor::BLACK,
        }
    }
}

/// Document information dictionary.
///
/// The key set is fixed; fields the document does not carry are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub mod_date: String,
    #[serde(default)]
    pub trapped: String,
    #[serde(default)]
    pub encryption: String,
}
