//! Stamp descriptors: what gets drawn onto the page.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::detect::detect_image_format;
use crate::error::{Error, Result};
use crate::render::metrics;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub const RED: RgbColor = RgbColor::new(1.0, 0.0, 0.0);
    pub const BLACK: RgbColor = RgbColor::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channel values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::RED
    }
}

/// A decoded raster in RGBA8 layout.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl RasterImage {
    /// Wrap raw RGBA8 pixels. The buffer length must be `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidStamp(format!(
                "pixel buffer has {} bytes, expected {} for {}x{} RGBA",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode a PNG or JPEG image.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::MissingInput("stamp image"));
        }
        let format = detect_image_format(data)?;
        log::debug!("Decoding {} stamp image ({} bytes)", format.name(), data.len());
        let rgba = image::load_from_memory(data)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Read and decode an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::decode(&data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel data, row-major from the top row.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks_exact(4).any(|px| px[3] != u8::MAX)
    }

    /// Split into packed RGB samples and an 8-bit alpha plane.
    pub fn split_alpha(&self) -> (Vec<u8>, Vec<u8>) {
        let count = self.width as usize * self.height as usize;
        let mut rgb = Vec::with_capacity(count * 3);
        let mut alpha = Vec::with_capacity(count);
        for px in self.pixels.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }
        (rgb, alpha)
    }
}

/// A text stamp drawn in Helvetica.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStamp {
    pub content: String,
    pub color: RgbColor,
    pub font_size: f64,
}

impl TextStamp {
    /// Default font size in points.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Red 20pt text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            color: RgbColor::RED,
            font_size: Self::DEFAULT_FONT_SIZE,
        }
    }

    pub fn with_color(mut self, color: RgbColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn metrics(&self) -> metrics::TextMetrics {
        metrics::measure(&self.content, self.font_size)
    }
}

/// An image stamp with its intrinsic pixel size and scale factor.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStamp {
    pub raster: Arc<RasterImage>,
    pub intrinsic_width: u32,
    pub intrinsic_height: u32,
    pub scale: f64,
}

impl ImageStamp {
    /// Stamp at the raster's native size (scale 1.0).
    pub fn new(raster: RasterImage) -> Self {
        Self {
            intrinsic_width: raster.width(),
            intrinsic_height: raster.height(),
            raster: Arc::new(raster),
            scale: 1.0,
        }
    }

    /// Decode PNG/JPEG bytes into a stamp.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::new(RasterImage::decode(data)?))
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Width and height on the page: intrinsic size times scale.
    pub fn rendered_size(&self) -> (f64, f64) {
        (
            f64::from(self.intrinsic_width) * self.scale,
            f64::from(self.intrinsic_height) * self.scale,
        )
    }
}

/// Either a text or an image stamp.
#[derive(Debug, Clone, PartialEq)]
pub enum StampDescriptor {
    Text(TextStamp),
    Image(ImageStamp),
}

impl StampDescriptor {
    pub fn text(content: impl Into<String>) -> Self {
        StampDescriptor::Text(TextStamp::new(content))
    }

    pub fn image(raster: RasterImage, scale: f64) -> Self {
        StampDescriptor::Image(ImageStamp::new(raster).with_scale(scale))
    }

    pub fn is_image(&self) -> bool {
        matches!(self, StampDescriptor::Image(_))
    }

    /// Footprint used for placement: the same box the overlay draws into.
    pub fn footprint(&self) -> (f64, f64) {
        match self {
            StampDescriptor::Text(text) => {
                let m = text.metrics();
                (m.width, m.height)
            }
            StampDescriptor::Image(image) => image.rendered_size(),
        }
    }

    /// Reject stamps that cannot produce any drawable output.
    pub fn validate(&self) -> Result<()> {
        match self {
            StampDescriptor::Text(text) => {
                if text.content.is_empty() {
                    return Err(Error::MissingInput("stamp text"));
                }
                if !(text.font_size.is_finite() && text.font_size > 0.0) {
                    return Err(Error::InvalidStamp(format!(
                        "font size must be positive, got {}",
                        text.font_size
                    )));
                }
            }
            StampDescriptor::Image(image) => {
                if image.intrinsic_width == 0 || image.intrinsic_height == 0 {
                    return Err(Error::InvalidStamp("image has zero size".to_string()));
                }
                if !(image.scale.is_finite() && image.scale > 0.0) {
                    return Err(Error::InvalidStamp(format!(
                        "scale must be positive, got {}",
                        image.scale
                    )));
                }
            }
        }
        Ok(())
    }
}

impl From<TextStamp> for StampDescriptor {
    fn from(stamp: TextStamp) -> Self {
        StampDescriptor::Text(stamp)
    }
}

impl From<ImageStamp> for StampDescriptor {
    fn from(stamp: ImageStamp) -> Self {
        StampDescriptor::Image(stamp)
    }
}
