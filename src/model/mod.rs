//! Stamp model types.
//!
//! Everything here is request-scoped plain data: the stamp to draw, where to
//! put it, and the page geometry used to resolve its position.

mod geometry;
mod placement;
mod stamp;

pub use geometry::{
    compute_position, compute_position_letter, Anchor, PageSize, Point, Rect, EDGE_MARGIN,
};
pub use placement::Placement;
pub use stamp::{ImageStamp, RasterImage, RgbColor, StampDescriptor, TextStamp};
