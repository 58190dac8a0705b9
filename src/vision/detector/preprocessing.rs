// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for YOLO detection models

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

use super::BoundingBox;

/// Padding colour used by Ultralytics letterboxing
pub const LETTERBOX_FILL: u8 = 114;

/// Scale and padding applied while letterboxing
///
/// Needed to map boxes from model input space back to the image that was
/// handed to the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub pad_x: u32,
    /// Y offset from padding
    pub pad_y: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    /// Calculate letterbox geometry for an image of the given size
    pub fn new(source_width: u32, source_height: u32, target_size: u32) -> Self {
        if source_width == 0 || source_height == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0,
                pad_y: 0,
                source_width,
                source_height,
            };
        }

        let scale = (target_size as f32 / source_width as f32)
            .min(target_size as f32 / source_height as f32);
        let (new_w, new_h) = scaled_size(source_width, source_height, scale);

        Self {
            scale,
            pad_x: (target_size - new_w) / 2,
            pad_y: (target_size - new_h) / 2,
            source_width,
            source_height,
        }
    }

    /// Map a box from model input space back to source image space
    pub fn map_to_source(&self, bbox: BoundingBox) -> BoundingBox {
        BoundingBox {
            x1: (bbox.x1 - self.pad_x as f32) / self.scale,
            y1: (bbox.y1 - self.pad_y as f32) / self.scale,
            x2: (bbox.x2 - self.pad_x as f32) / self.scale,
            y2: (bbox.y2 - self.pad_y as f32) / self.scale,
        }
        .clamped(self.source_width as f32, self.source_height as f32)
    }
}

fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    (new_w, new_h)
}

/// Resize with aspect ratio preserved and pad to a square of `target_size`
pub fn letterbox_image(image: &DynamicImage, target_size: u32) -> (RgbImage, Letterbox) {
    let (w, h) = image.dimensions();
    let geometry = Letterbox::new(w, h, target_size);

    let mut output = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([LETTERBOX_FILL, LETTERBOX_FILL, LETTERBOX_FILL]),
    );

    if w == 0 || h == 0 {
        return (output, geometry);
    }

    let (new_w, new_h) = scaled_size(w, h, geometry.scale);
    let resized = image
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgb8();

    image::imageops::replace(
        &mut output,
        &resized,
        geometry.pad_x as i64,
        geometry.pad_y as i64,
    );

    (output, geometry)
}

/// Preprocess an image for YOLO detection
///
/// Steps:
/// 1. Letterbox to `target_size` x `target_size`
/// 2. Scale pixels to 0..1
/// 3. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_yolo(image: &DynamicImage, target_size: u32) -> (Array4<f32>, Letterbox) {
    let (rgb, geometry) = letterbox_image(image, target_size);
    let size = target_size as usize;

    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, geometry)
}
