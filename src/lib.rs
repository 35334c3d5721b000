//! # pdfstamp
//!
//! Overlay text or image stamps onto the pages of a PDF document.
//!
//! A stamp is placed relative to a named anchor on each page (a corner or
//! the center), shifted by point offsets, and drawn with a chosen opacity and
//! rotation. Each target page receives a freshly rendered overlay that is
//! composited on top of its existing content; all other pages are copied
//! unchanged.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfstamp::{stamp_file, Anchor, StampConfig, TextStamp};
//!
//! fn main() -> pdfstamp::Result<()> {
//!     let config = StampConfig::new(TextStamp::new("CONFIDENTIAL"))
//!         .with_anchor(Anchor::TopRight)
//!         .with_opacity(0.5);
//!
//!     let report = stamp_file("input.pdf", "stamped.pdf", &config)?;
//!     println!("Stamped {} pages", report.pages.len());
//!     Ok(())
//! }
//! ```

pub mod compositor;
pub mod detect;
pub mod error;
pub mod model;
pub mod render;

pub use compositor::{
    stamp_document, LopdfBackend, PageScope, PageSizing, PdfBackend, StampConfig, StampReport,
    StampedPage,
};
pub use detect::{detect_image_format, detect_pdf_from_bytes, is_pdf_bytes, StampImageFormat};
pub use error::{Error, Result};
pub use model::{
    compute_position, compute_position_letter, Anchor, ImageStamp, PageSize, Placement, Point,
    RasterImage, Rect, RgbColor, StampDescriptor, TextStamp,
};
pub use render::{render_overlay, Overlay};

use std::io::Read;
use std::path::Path;

/// Stamp a loaded backend and serialize the result.
fn finish(mut backend: LopdfBackend, config: &StampConfig) -> Result<(Vec<u8>, StampReport)> {
    let report = stamp_document(&mut backend, config)?;
    if config.update_metadata {
        backend.touch_metadata()?;
    }
    let bytes = backend.save_to_bytes()?;
    Ok((bytes, report))
}

/// Stamp a PDF held in memory and return the new document's bytes.
///
/// # Example
///
/// ```no_run
/// use pdfstamp::{stamp_bytes, StampConfig, StampDescriptor};
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let config = StampConfig::new(StampDescriptor::text("DRAFT")).every_page(false);
/// let stamped = stamp_bytes(&data, &config).unwrap();
/// ```
pub fn stamp_bytes(data: &[u8], config: &StampConfig) -> Result<Vec<u8>> {
    stamp_bytes_with_report(data, config).map(|(bytes, _)| bytes)
}

/// Like [`stamp_bytes`], also returning where the stamp was placed.
pub fn stamp_bytes_with_report(data: &[u8], config: &StampConfig) -> Result<(Vec<u8>, StampReport)> {
    config.stamp.validate()?;
    finish(LopdfBackend::load_bytes(data)?, config)
}

/// Stamp a PDF read from `reader`.
pub fn stamp_reader<R: Read>(reader: R, config: &StampConfig) -> Result<Vec<u8>> {
    config.stamp.validate()?;
    finish(LopdfBackend::load_reader(reader)?, config).map(|(bytes, _)| bytes)
}

/// Stamp `input` and write the result to `output`.
///
/// Nothing is written unless the whole document was stamped successfully.
pub fn stamp_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &StampConfig,
) -> Result<StampReport> {
    config.stamp.validate()?;
    let (bytes, report) = finish(LopdfBackend::load_file(input)?, config)?;
    std::fs::write(output, bytes)?;
    Ok(report)
}

/// Stamp `input` and write the result to `output` using tokio file I/O.
#[cfg(feature = "async")]
pub async fn stamp_file_async<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &StampConfig,
) -> Result<StampReport> {
    let data = tokio::fs::read(input).await?;
    let (bytes, report) = stamp_bytes_with_report(&data, config)?;
    tokio::fs::write(output, bytes).await?;
    Ok(report)
}

/// A one-page PDF containing only the stamp, placed as it would be on a
/// page of `page` size.
pub fn preview_bytes(config: &StampConfig, page: PageSize) -> Result<Vec<u8>> {
    config.stamp.validate()?;
    let overlay = compositor::overlay_for_page(config, page);
    let mut doc = overlay.to_document()?;
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Builder that gathers stamping inputs and checks they are present.
///
/// # Example
///
/// ```no_run
/// use pdfstamp::{Anchor, Stamper};
///
/// let pdf = std::fs::read("document.pdf")?;
/// let logo = std::fs::read("logo.png")?;
/// let stamped = Stamper::new()
///     .image(&logo, 0.5)?
///     .anchor(Anchor::BottomRight)
///     .opacity(0.8)
///     .first_page_only()
///     .stamp_bytes(&pdf)?;
/// # Ok::<(), pdfstamp::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Stamper {
    stamp: Option<StampDescriptor>,
    placement: Placement,
    scope: PageScope,
    page_sizing: PageSizing,
    sequential: bool,
}

impl Stamper {
    /// Create a new Stamper builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a text stamp.
    pub fn text(mut self, stamp: TextStamp) -> Self {
        self.stamp = Some(stamp.into());
        self
    }

    /// Use an image stamp decoded from PNG or JPEG bytes.
    pub fn image(mut self, data: &[u8], scale: f64) -> Result<Self> {
        self.stamp = Some(ImageStamp::from_bytes(data)?.with_scale(scale).into());
        Ok(self)
    }

    /// Use an already built stamp.
    pub fn stamp(mut self, stamp: impl Into<StampDescriptor>) -> Self {
        self.stamp = Some(stamp.into());
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.placement.anchor = anchor;
        self
    }

    pub fn offset(mut self, x_offset: i32, y_offset: i32) -> Self {
        self.placement = self.placement.with_offset(x_offset, y_offset);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.placement.opacity = opacity;
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.placement.rotation_degrees = degrees;
        self
    }

    /// Stamp only the first page.
    pub fn first_page_only(mut self) -> Self {
        self.scope = PageScope::FirstPage;
        self
    }

    pub fn scope(mut self, scope: PageScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn page_sizing(mut self, sizing: PageSizing) -> Self {
        self.page_sizing = sizing;
        self
    }

    /// Disable parallel overlay rendering.
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    /// Freeze the gathered inputs into a [`StampConfig`].
    pub fn build(self) -> Result<StampConfig> {
        let stamp = self.stamp.ok_or(Error::MissingInput("stamp"))?;
        stamp.validate()?;
        let mut config = StampConfig::new(stamp)
            .with_placement(self.placement)
            .with_scope(self.scope)
            .with_page_sizing(self.page_sizing);
        if self.sequential {
            config = config.sequential();
        }
        Ok(config)
    }

    /// Stamp a PDF held in memory.
    pub fn stamp_bytes(self, data: &[u8]) -> Result<Vec<u8>> {
        let config = self.build()?;
        stamp_bytes(data, &config)
    }

    /// Stamp a file on disk.
    pub fn stamp_file<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        input: P,
        output: Q,
    ) -> Result<StampReport> {
        let config = self.build()?;
        stamp_file(input, output, &config)
    }
}
