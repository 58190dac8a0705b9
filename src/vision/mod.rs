// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based object detection
//!
//! This module provides:
//! - Upload decoding and area-averaged downscaling
//! - The `ObjectDetector` capability and its YOLO/ONNX implementation
//! - The detection pipeline that rescales and filters model output
//!
//! Inference runs on CPU only with a single thread by default.

pub mod detector;
pub mod image_utils;
pub mod pipeline;

pub use detector::{
    BoundingBox, ClassNames, DetectorError, DetectorParams, ObjectDetector, RawDetection,
    YoloOnnxDetector,
};
pub use image_utils::{decode_image_bytes, detect_format, downscale_by_percent, ImageError, ImageInfo};
pub use pipeline::{
    Detection, DetectionOutcome, DetectionPipeline, PipelineConfig, PipelineError,
    CONFIDENCE_THRESHOLD, DETECTION_SCALE_PERCENT,
};
