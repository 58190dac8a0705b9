// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection model abstraction
//!
//! The service treats the detection model as an opaque collaborator: it
//! hands over pixels and gets back labelled, scored boxes in the pixel
//! space of the image it handed over. `YoloOnnxDetector` is the production
//! implementation; tests inject stubs.
//!
//! Components:
//! - `labels` - Class id to label tables
//! - `preprocessing` - Letterboxing into the model's square input
//! - `postprocess` - YOLO output decoding and non-maximum suppression
//! - `pool` - One session per inference worker
//! - `yolo` - ONNX Runtime session wrapper

pub mod labels;
pub mod pool;
pub mod postprocess;
pub mod preprocessing;
pub mod yolo;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use labels::ClassNames;
pub use pool::SessionPool;
pub use postprocess::{decode_yolo_output, non_max_suppression};
pub use yolo::YoloOnnxDetector;

/// Errors raised by a detector while running inference
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unexpected model output: {0}")]
    InvalidOutput(String),

    #[error("model session unavailable: {0}")]
    SessionUnavailable(String),
}

/// Axis-aligned box as `(x1, y1)` top-left and `(x2, y2)` bottom-right corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from centre, width and height (YOLO's native box encoding)
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Swap corners where needed so `x1 <= x2` and `y1 <= y2`
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Multiply every coordinate by `factor`
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x1: self.x1 * factor,
            y1: self.y1 * factor,
            x2: self.x2 * factor,
            y2: self.y2 * factor,
        }
    }

    /// Clamp the box into `[0, width] x [0, height]`
    pub fn clamped(self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// A single detection as reported by the model
///
/// Coordinates are in the pixel space of the image passed to
/// [`ObjectDetector::detect`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub label: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Inference parameters fixed when the model handle is created
#[derive(Debug, Clone)]
pub struct DetectorParams {
    /// Square model input side, 640 for stock YOLOv8 exports
    pub input_size: u32,
    /// Scores at or below this are dropped during decoding
    pub conf_threshold: f32,
    /// Same-class boxes overlapping more than this are suppressed
    pub iou_threshold: f32,
    /// Cap on boxes returned per image after NMS
    pub max_detections: usize,
    /// ONNX Runtime intra-op and inter-op thread count
    pub threads: usize,
    /// Sessions loaded, one per concurrent inference
    pub workers: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.6,
            iou_threshold: 0.5,
            max_detections: 5,
            threads: 1,
            workers: 1,
        }
    }
}

/// Capability to find objects in an image
///
/// Implementations are loaded once at startup and shared read-only across
/// requests, hence `Send + Sync` and `&self`.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError>;
}
