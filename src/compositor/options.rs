//! Stamping configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Anchor, PageSize, Placement, StampDescriptor};

/// Which pages receive the stamp.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageScope {
    /// Only the first page
    FirstPage,
    /// Every page
    #[default]
    AllPages,
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageScope {
    /// Upper bound on the pages a parsed page list may expand to.
    pub const MAX_LISTED_PAGES: usize = 100_000;

    /// Check if the page at zero-based `index` is stamped.
    pub fn includes(&self, index: usize) -> bool {
        match self {
            PageScope::FirstPage => index == 0,
            PageScope::AllPages => true,
            PageScope::Pages(pages) => u32::try_from(index + 1)
                .map(|number| pages.contains(&number))
                .unwrap_or(false),
        }
    }

    /// Parse a scope string: `all`, `first`, or a page list such as `1,3,5-7`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" | "all" => return Ok(PageScope::AllPages),
            "first" => return Ok(PageScope::FirstPage),
            _ => {}
        }

        let invalid = || Error::Other(format!("Invalid page list: {}", s));
        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (
                    start.trim().parse::<u32>().map_err(|_| invalid())?,
                    end.trim().parse::<u32>().map_err(|_| invalid())?,
                ),
                None => {
                    let page = part.parse::<u32>().map_err(|_| invalid())?;
                    (page, page)
                }
            };
            if start == 0 || start > end {
                return Err(invalid());
            }
            let span = (end - start) as usize + 1;
            if pages.len() + span > PageScope::MAX_LISTED_PAGES {
                return Err(Error::Other(format!(
                    "Page list names more than {} pages: {}",
                    PageScope::MAX_LISTED_PAGES,
                    s
                )));
            }
            pages.extend(start..=end);
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageScope::Pages(pages))
    }
}

impl From<bool> for PageScope {
    /// `true` stamps every page, `false` only the first.
    fn from(every_page: bool) -> Self {
        if every_page {
            PageScope::AllPages
        } else {
            PageScope::FirstPage
        }
    }
}

/// How the page size used for placement is determined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSizing {
    /// Read each page's effective MediaBox (Letter when it cannot be read)
    #[default]
    MediaBox,
    /// Use the same size for every page
    Fixed(PageSize),
}

/// Everything needed to stamp a document.
///
/// Built once from user input and never mutated while stamping.
#[derive(Debug, Clone)]
pub struct StampConfig {
    /// What to draw
    pub stamp: StampDescriptor,

    /// Where and how to draw it
    pub placement: Placement,

    /// Which pages to stamp
    pub scope: PageScope,

    /// Page size source for position math
    pub page_sizing: PageSizing,

    /// Whether to render overlays in parallel
    pub parallel: bool,

    /// Whether to update `/Producer` and `/ModDate` on save
    pub update_metadata: bool,
}

impl StampConfig {
    /// Stamp every page at the top-left corner, fully opaque.
    pub fn new(stamp: impl Into<StampDescriptor>) -> Self {
        Self {
            stamp: stamp.into(),
            placement: Placement::default(),
            scope: PageScope::default(),
            page_sizing: PageSizing::default(),
            parallel: true,
            update_metadata: true,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.placement.anchor = anchor;
        self
    }

    pub fn with_offset(mut self, x_offset: i32, y_offset: i32) -> Self {
        self.placement = self.placement.with_offset(x_offset, y_offset);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.placement.opacity = opacity;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.placement.rotation_degrees = degrees;
        self
    }

    pub fn with_scope(mut self, scope: PageScope) -> Self {
        self.scope = scope;
        self
    }

    /// Stamp every page (`true`) or only the first (`false`).
    pub fn every_page(mut self, every_page: bool) -> Self {
        self.scope = every_page.into();
        self
    }

    pub fn with_page_sizing(mut self, sizing: PageSizing) -> Self {
        self.page_sizing = sizing;
        self
    }

    /// Assume US Letter for every page regardless of its MediaBox.
    pub fn fixed_letter(self) -> Self {
        self.with_page_sizing(PageSizing::Fixed(PageSize::LETTER))
    }

    /// Disable parallel overlay rendering.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_metadata_update(mut self, update: bool) -> Self {
        self.update_metadata = update;
        self
    }
}
