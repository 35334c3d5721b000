//! Where and how a stamp sits on the page.

use serde::{Deserialize, Serialize};

use super::geometry::Anchor;

/// Anchor, offsets, opacity and rotation of a stamp.
///
/// Values are taken as given: offsets, opacity and rotation are not clamped
/// or range-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Reference point the offsets are measured from
    pub anchor: Anchor,

    /// Horizontal offset in points, toward the page interior for corner anchors
    pub x_offset: i32,

    /// Vertical offset in points, toward the page interior for corner anchors
    pub y_offset: i32,

    /// Fill and stroke alpha, expected in (0, 1]
    pub opacity: f64,

    /// Counter-clockwise rotation about the stamp center, expected in [-180, 180]
    pub rotation_degrees: f64,
}

impl Placement {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            ..Self::default()
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_offset(mut self, x_offset: i32, y_offset: i32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Opacity 1 and no rotation: the overlay is drawn without extra transforms.
    pub fn is_identity_transform(&self) -> bool {
        self.opacity >= 1.0 && self.rotation_degrees == 0.0
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            anchor: Anchor::TopLeft,
            x_offset: 0,
            y_offset: 0,
            opacity: 1.0,
            rotation_degrees: 0.0,
        }
    }
}
