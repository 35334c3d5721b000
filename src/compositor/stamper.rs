//! Stamp compositing across a document's pages.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{compute_position, PageSize, Rect};
use crate::render::overlay::{render_overlay, Overlay};

use super::backend::{PageId, PdfBackend};
use super::options::{PageSizing, StampConfig};

/// Where the stamp landed on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedPage {
    /// Page number (1-indexed)
    pub page: u32,

    /// Page size used for placement
    pub page_size: PageSize,

    /// Stamp bounding box before rotation
    pub bounds: Rect,

    /// Axis-aligned box covered after rotation
    pub visible_bounds: Rect,

    /// Whether the visible stamp extends past the page edges
    pub clipped: bool,
}

/// Summary of a stamping run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StampReport {
    /// Pages in the document
    pub page_count: usize,

    /// Stamped pages, in document order
    pub pages: Vec<StampedPage>,
}

impl StampReport {
    /// Numbers (1-indexed) of the stamped pages.
    pub fn stamped_pages(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p.page).collect()
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Other(format!("Failed to serialize report: {}", e)))
    }
}

struct Target {
    number: u32,
    id: PageId,
    size: PageSize,
}

fn resolve_size<B: PdfBackend>(backend: &B, page: PageId, number: u32, sizing: PageSizing) -> PageSize {
    match sizing {
        PageSizing::Fixed(size) => size,
        PageSizing::MediaBox => backend.page_size(page).unwrap_or_else(|| {
            log::warn!("Page {} has no usable MediaBox, assuming Letter", number);
            PageSize::LETTER
        }),
    }
}

/// Build the overlay for one page: position from the page size, then render.
pub fn overlay_for_page(config: &StampConfig, page: PageSize) -> Overlay {
    let placement = &config.placement;
    let (width, height) = config.stamp.footprint();
    let origin = compute_position(
        placement.anchor,
        width,
        height,
        placement.x_offset,
        placement.y_offset,
        page,
    );
    render_overlay(
        &config.stamp,
        origin,
        placement.opacity,
        placement.rotation_degrees,
        page,
    )
}

/// Stamp the pages selected by `config.scope`, leaving all others untouched.
///
/// Each target page gets its own freshly rendered overlay. Page count and
/// order never change; a document without pages is returned as is. Stamping
/// an already stamped document adds another overlay on top.
pub fn stamp_document<B: PdfBackend>(backend: &mut B, config: &StampConfig) -> Result<StampReport> {
    config.stamp.validate()?;

    let pages = backend.pages();
    let targets: Vec<Target> = pages
        .iter()
        .enumerate()
        .filter(|(index, _)| config.scope.includes(*index))
        .map(|(index, id)| {
            let number = index as u32 + 1;
            Target {
                number,
                id: *id,
                size: resolve_size(backend, *id, number, config.page_sizing),
            }
        })
        .collect();

    log::debug!(
        "Stamping {} of {} pages ({} stamp)",
        targets.len(),
        pages.len(),
        if config.stamp.is_image() { "image" } else { "text" }
    );

    let overlays: Vec<Overlay> = if config.parallel && targets.len() > 1 {
        targets
            .par_iter()
            .map(|t| overlay_for_page(config, t.size))
            .collect()
    } else {
        targets
            .iter()
            .map(|t| overlay_for_page(config, t.size))
            .collect()
    };

    let mut report = StampReport {
        page_count: pages.len(),
        pages: Vec::with_capacity(targets.len()),
    };

    for (target, overlay) in targets.iter().zip(&overlays) {
        backend.merge_overlay(target.id, overlay)?;

        let visible = overlay.visible_bounds();
        let clipped = !visible.fits_within(&target.size);
        if clipped {
            log::debug!("Page {}: stamp extends past the page edge", target.number);
        }
        report.pages.push(StampedPage {
            page: target.number,
            page_size: target.size,
            bounds: overlay.bounds(),
            visible_bounds: visible,
            clipped,
        });
    }

    Ok(report)
}
