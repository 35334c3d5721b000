//! Overlay rendering: one page-sized drawing surface holding only the stamp.
//!
//! An [`Overlay`] is independent of any document. It records what to draw and
//! which resources that needs; the content stream is produced against a set of
//! resource names chosen by whoever embeds it, so the same overlay can be
//! merged into a page that already has resources with conflicting names.

use std::io::Write;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};
use crate::model::{PageSize, Point, RasterImage, Rect, RgbColor, StampDescriptor};

use super::metrics::{self, STAMP_FONT};

/// Resource names an overlay's content stream refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub font: String,
    pub graphics_state: String,
    pub image: String,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            font: "StampF1".to_string(),
            graphics_state: "StampGS1".to_string(),
            image: "StampIm1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Text {
        bytes: Vec<u8>,
        color: RgbColor,
        font_size: f64,
        baseline: Point,
    },
    Image {
        raster: Arc<RasterImage>,
        target: Rect,
    },
}

/// A transient single-page surface containing the stamp graphics.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    page: PageSize,
    bounds: Rect,
    opacity: f64,
    rotation_degrees: f64,
    mark: Mark,
}

/// Draw `stamp` with its bounding box's bottom-left corner at `origin`.
///
/// Rotation is applied about the center of the stamp's bounding box so the
/// stamp turns in place.
pub fn render_overlay(
    stamp: &StampDescriptor,
    origin: Point,
    opacity: f64,
    rotation_degrees: f64,
    page: PageSize,
) -> Overlay {
    let (width, height) = stamp.footprint();
    let bounds = Rect::from_origin_size(origin, width, height);

    let mark = match stamp {
        StampDescriptor::Text(text) => Mark::Text {
            bytes: metrics::encode_win_ansi(&text.content),
            color: text.color,
            font_size: text.font_size,
            baseline: Point::new(origin.x, origin.y + text.metrics().descent),
        },
        StampDescriptor::Image(image) => Mark::Image {
            target: fit_preserving_aspect(
                &bounds,
                image.raster.width() as f64,
                image.raster.height() as f64,
            ),
            raster: Arc::clone(&image.raster),
        },
    };

    Overlay {
        page,
        bounds,
        opacity,
        rotation_degrees,
        mark,
    }
}

/// Largest rectangle with the raster's aspect ratio centered inside `bounds`.
fn fit_preserving_aspect(bounds: &Rect, src_width: f64, src_height: f64) -> Rect {
    if src_width <= 0.0 || src_height <= 0.0 {
        return *bounds;
    }
    let factor = (bounds.width / src_width).min(bounds.height / src_height);
    let width = src_width * factor;
    let height = src_height * factor;
    Rect {
        x: bounds.x + (bounds.width - width) / 2.0,
        y: bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

impl Overlay {
    /// Size of the page this overlay was rendered for.
    pub fn page_size(&self) -> PageSize {
        self.page
    }

    /// The stamp's bounding box before rotation.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Axis-aligned box actually covered once rotation is applied.
    pub fn visible_bounds(&self) -> Rect {
        self.bounds.rotated_bounds(self.rotation_degrees)
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// Whether a translucency graphics state is needed.
    pub fn uses_graphics_state(&self) -> bool {
        self.opacity < 1.0
    }

    pub fn uses_font(&self) -> bool {
        matches!(self.mark, Mark::Text { .. })
    }

    /// The raster drawn by this overlay, if it is an image stamp.
    pub fn image(&self) -> Option<&Arc<RasterImage>> {
        match &self.mark {
            Mark::Image { raster, .. } => Some(raster),
            Mark::Text { .. } => None,
        }
    }

    /// Content-stream operations referring to resources by `names`.
    ///
    /// Everything is wrapped in `q`/`Q` so the overlay's state changes do not
    /// outlive it.
    pub fn operations(&self, names: &ResourceNames) -> Vec<Operation> {
        let mut ops = vec![Operation::new("q", vec![])];

        if self.uses_graphics_state() {
            ops.push(Operation::new("gs", vec![name(&names.graphics_state)]));
        }

        if self.rotation_degrees != 0.0 {
            let center = self.bounds.center();
            let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
            ops.push(Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), real(center.x), real(center.y)],
            ));
            ops.push(Operation::new(
                "cm",
                vec![real(cos), real(sin), real(-sin), real(cos), 0.into(), 0.into()],
            ));
            ops.push(Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), real(-center.x), real(-center.y)],
            ));
        }

        match &self.mark {
            Mark::Text {
                bytes,
                color,
                font_size,
                baseline,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "rg",
                    vec![real(color.r), real(color.g), real(color.b)],
                ));
                ops.push(Operation::new(
                    "Tf",
                    vec![name(&names.font), real(*font_size)],
                ));
                ops.push(Operation::new("Td", vec![real(baseline.x), real(baseline.y)]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(bytes.clone(), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Mark::Image { target, .. } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        real(target.width),
                        0.into(),
                        0.into(),
                        real(target.height),
                        real(target.x),
                        real(target.y),
                    ],
                ));
                ops.push(Operation::new("Do", vec![name(&names.image)]));
                ops.push(Operation::new("Q", vec![]));
            }
        }

        ops.push(Operation::new("Q", vec![]));
        ops
    }

    /// Encoded content stream bytes.
    pub fn encode_content(&self, names: &ResourceNames) -> Result<Vec<u8>> {
        Content {
            operations: self.operations(names),
        }
        .encode()
        .map_err(|e| Error::Render(format!("Failed to encode overlay content: {}", e)))
    }

    /// A standalone one-page PDF holding just this overlay.
    pub fn to_document(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let names = ResourceNames::default();
        let pages_id = doc.new_object_id();

        let mut resources = Dictionary::new();
        if self.uses_font() {
            let font_id = doc.add_object(font_dictionary());
            resources.set("Font", dictionary! { names.font.as_str() => font_id });
        }
        if self.uses_graphics_state() {
            let gs_id = doc.add_object(graphics_state(self.opacity));
            resources.set(
                "ExtGState",
                dictionary! { names.graphics_state.as_str() => gs_id },
            );
        }
        if let Some(raster) = self.image() {
            let image_id = embed_image(&mut doc, raster)?;
            resources.set("XObject", dictionary! { names.image.as_str() => image_id });
        }

        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            self.encode_content(&names)?,
        ));
        let media_box: Vec<Object> = self.page.media_box().iter().map(|v| real(*v)).collect();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }
}

/// Type1 Helvetica with WinAnsi encoding.
pub(crate) fn font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => STAMP_FONT,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Graphics state setting both fill and stroke alpha.
pub(crate) fn graphics_state(opacity: f64) -> Dictionary {
    dictionary! {
        "Type" => "ExtGState",
        "ca" => real(opacity),
        "CA" => real(opacity),
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Add the raster as an image XObject, with its alpha channel as a soft mask.
pub(crate) fn embed_image(doc: &mut Document, raster: &RasterImage) -> Result<ObjectId> {
    let (rgb, alpha) = raster.split_alpha();
    let width = i64::from(raster.width());
    let height = i64::from(raster.height());

    let smask_id = if raster.has_transparency() {
        let mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha)?,
        );
        Some(doc.add_object(mask))
    } else {
        None
    };

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if let Some(id) = smask_id {
        image_dict.set("SMask", id);
    }
    Ok(doc.add_object(Stream::new(image_dict, deflate(&rgb)?)))
}
