//! Input format detection for source documents and stamp images.

use crate::error::{Error, Result};

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

/// Raster formats accepted as stamp images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampImageFormat {
    Png,
    Jpeg,
}

impl StampImageFormat {
    /// Lowercase name of the format.
    pub fn name(&self) -> &'static str {
        match self {
            StampImageFormat::Png => "png",
            StampImageFormat::Jpeg => "jpeg",
        }
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Read the PDF header from the start of a byte buffer.
///
/// Returns `Error::UnknownFormat` when the data does not begin with `%PDF-x.y`.
pub fn detect_pdf_from_bytes(data: &[u8]) -> Result<PdfHeader> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfHeader { version })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_pdf_from_bytes(data).is_ok()
}

/// Identify a stamp image from its leading bytes.
///
/// Only PNG and JPEG are accepted; anything else is `Error::ImageDecode`.
pub fn detect_image_format(data: &[u8]) -> Result<StampImageFormat> {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => Ok(StampImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => Ok(StampImageFormat::Jpeg),
        Ok(other) => Err(Error::ImageDecode(format!(
            "unsupported stamp image format: {:?}",
            other
        ))),
        Err(_) => Err(Error::ImageDecode(
            "unrecognized stamp image data".to_string(),
        )),
    }
}
