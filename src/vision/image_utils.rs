// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and resizing helpers for uploaded images

use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

/// Maximum accepted upload size for decoding (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Errors raised while turning upload bytes into pixels
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes from a multipart upload
///
/// The format is sniffed from magic bytes rather than trusted from the
/// upload's content type.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Dimensions a percentage downscale produces
///
/// Each side is truncated towards zero, then clamped to at least one pixel
/// so tiny uploads still reach the model.
pub fn scaled_dimensions(width: u32, height: u32, scale_percent: u32) -> (u32, u32) {
    let w = (width as u64 * scale_percent as u64 / 100) as u32;
    let h = (height as u64 * scale_percent as u64 / 100) as u32;
    (w.max(1), h.max(1))
}

/// Downscale an image by a fixed percentage using area averaging
///
/// `thumbnail_exact` averages every source pixel that falls into a target
/// pixel, which is the box/area filter. At 100% the image is returned as is.
pub fn downscale_by_percent(image: &DynamicImage, scale_percent: u32) -> DynamicImage {
    if scale_percent >= 100 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let (new_w, new_h) = scaled_dimensions(width, height, scale_percent);
    image.thumbnail_exact(new_w, new_h)
}
