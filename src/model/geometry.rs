//! Page geometry and stamp placement math.
//!
//! All coordinates are PDF user-space points with the origin at the
//! bottom-left corner of the page and y increasing upward.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Distance kept between a corner-anchored stamp and the page edge.
pub const EDGE_MARGIN: f64 = 10.0;

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of a page, plus the lower-left corner of its MediaBox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// MediaBox lower-left x
    #[serde(default)]
    pub origin_x: f64,
    /// MediaBox lower-left y
    #[serde(default)]
    pub origin_y: f64,
}

impl PageSize {
    /// US Letter (8.5 x 11 inches).
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);

    /// A4 (210 x 297 mm).
    pub const A4: PageSize = PageSize::new(595.0, 842.0);

    /// Create a page size with the origin at (0, 0).
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    /// Build from MediaBox corners `[llx lly urx ury]`.
    pub fn from_media_box(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Self {
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
            origin_x: llx.min(urx),
            origin_y: lly.min(ury),
        }
    }

    /// MediaBox array values `[llx, lly, urx, ury]`.
    pub fn media_box(&self) -> [f64; 4] {
        [
            self.origin_x,
            self.origin_y,
            self.origin_x + self.width,
            self.origin_y + self.height,
        ]
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

/// Axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle with bottom-left corner `origin`.
    pub fn from_origin_size(origin: Point, width: f64, height: f64) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Axis-aligned bounds of this rectangle after rotating it about its center.
    pub fn rotated_bounds(&self, degrees: f64) -> Rect {
        if degrees == 0.0 {
            return *self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let w = self.width * cos.abs() + self.height * sin.abs();
        let h = self.width * sin.abs() + self.height * cos.abs();
        let c = self.center();
        Rect {
            x: c.x - w / 2.0,
            y: c.y - h / 2.0,
            width: w,
            height: h,
        }
    }

    /// Whether the rectangle lies entirely inside the page.
    pub fn fits_within(&self, page: &PageSize) -> bool {
        let [llx, lly, urx, ury] = page.media_box();
        self.x >= llx && self.y >= lly && self.x + self.width <= urx && self.y + self.height <= ury
    }
}

/// Named reference point on a page used as the origin for offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl Anchor {
    /// All anchors, in form order.
    pub const ALL: [Anchor; 5] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
        Anchor::Center,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "Top Left",
            Anchor::TopRight => "Top Right",
            Anchor::BottomLeft => "Bottom Left",
            Anchor::BottomRight => "Bottom Right",
            Anchor::Center => "Center",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Anchor {
    type Err = Error;

    /// Accepts `top-left`, `Top Left`, `top_left`, `topleft` and `tl` style names.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "topleft" | "tl" => Ok(Anchor::TopLeft),
            "topright" | "tr" => Ok(Anchor::TopRight),
            "bottomleft" | "bl" => Ok(Anchor::BottomLeft),
            "bottomright" | "br" => Ok(Anchor::BottomRight),
            "center" | "centre" | "c" => Ok(Anchor::Center),
            _ => Err(Error::Other(format!("Unknown stamp position: {}", s))),
        }
    }
}

/// Bottom-left corner of a stamp's bounding box on the page.
///
/// Corner anchors keep [`EDGE_MARGIN`] points from the page edges; offsets move
/// the stamp away from its anchor corner (x toward the page interior, y
/// likewise). The result is not clamped and may lie partly or fully off-page.
pub fn compute_position(
    anchor: Anchor,
    stamp_width: f64,
    stamp_height: f64,
    x_offset: i32,
    y_offset: i32,
    page: PageSize,
) -> Point {
    let dx = f64::from(x_offset);
    let dy = f64::from(y_offset);
    let left = EDGE_MARGIN + dx;
    let right = page.width - stamp_width - EDGE_MARGIN - dx;
    let top = page.height - stamp_height - EDGE_MARGIN - dy;
    let bottom = EDGE_MARGIN + dy;

    let (x, y) = match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopRight => (right, top),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomRight => (right, bottom),
        Anchor::Center => (
            (page.width - stamp_width) / 2.0 + dx,
            (page.height - stamp_height) / 2.0 + dy,
        ),
    };

    Point::new(x + page.origin_x, y + page.origin_y)
}

/// [`compute_position`] on a US Letter page.
pub fn compute_position_letter(
    anchor: Anchor,
    stamp_width: f64,
    stamp_height: f64,
    x_offset: i32,
    y_offset: i32,
) -> Point {
    compute_position(
        anchor,
        stamp_width,
        stamp_height,
        x_offset,
        y_offset,
        PageSize::LETTER,
    )
}
