//! Stamp compositor: places an overlay on each target page of a document.

mod backend;
mod options;
mod stamper;

pub use backend::{LopdfBackend, PageId, PdfBackend};
pub use options::{PageScope, PageSizing, StampConfig};
pub use stamper::{overlay_for_page, stamp_document, StampReport, StampedPage};
