//! Overlay rendering and text measurement.

pub mod metrics;
pub mod overlay;

pub use metrics::{measure, text_width, TextMetrics};
pub use overlay::{render_overlay, Overlay, ResourceNames};
