//! PNG in, RGBA pixels out, and back.
//!
//! [`crate::stego`] works on interleaved 8-bit RGBA buffers. This module is
//! the adapter between those buffers and PNG files: every decodable PNG is
//! normalized to 8-bit RGBA on read, and always written back as 8-bit RGBA,
//! which is lossless for the hidden bits.

use std::fs;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::debug;

use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
use crate::stego::codec::CHANNELS;

/// An 8-bit RGBA image, row-major, no padding between rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Wraps an existing pixel buffer, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(CipherdeckError::user(
                ErrorKind::Format,
                format!(
                    "{}x{} RGBA image needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    pixels.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image of a single repeated color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: rgba.repeat(count),
        }
    }

    /// Text bytes this image can hide with [`crate::stego::embed`].
    pub fn capacity(&self) -> usize {
        crate::stego::capacity(self.pixels.len())
    }
}

/// Decodes PNG bytes into RGBA. Palette, grayscale, 16-bit and
/// transparency-chunk images are all converted.
pub fn decode_png(data: &[u8]) -> Result<RgbaImage> {
    let decoded = image::load_from_memory_with_format(data, ImageFormat::Png).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            "invalid PNG",
            e,
        )
    })?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "decoded png"
    );
    let rgba = decoded.into_rgba8();
    let (width, height) = rgba.dimensions();
    RgbaImage::new(width, height, rgba.into_raw())
}

/// Encodes an image as an 8-bit RGBA PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Format,
                "failed to encode PNG",
                e,
            )
        })?;
    Ok(out)
}

/// Reads and decodes the PNG at `path`.
pub fn read_png(path: &Path) -> Result<RgbaImage> {
    let data = fs::read(path).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to read from {}", path.display()),
            e,
        )
    })?;
    decode_png(&data).map_err(|e| e.with_context(format!("failed to decode {}", path.display())))
}

/// Encodes `image` and writes it to `path`, replacing any existing file.
pub fn write_png(path: &Path, image: &RgbaImage) -> Result<()> {
    let data = encode_png(image)?;
    fs::write(path, data).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to write {}", path.display()),
            e,
        )
    })
}
