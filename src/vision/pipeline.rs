// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection pipeline: decode, downscale, infer, rescale, filter, dedup
//!
//! Inference runs on a reduced copy of the upload to keep CPU cost down.
//! Boxes come back in the reduced image's pixel space and are multiplied by
//! `100 / scale_percent` to land in the original image's pixel space.

use image::DynamicImage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

use super::detector::{BoundingBox, DetectorError, ObjectDetector, RawDetection};
use super::image_utils::{decode_image_bytes, downscale_by_percent, ImageError, ImageInfo};

/// Default downscale applied before inference
pub const DETECTION_SCALE_PERCENT: u32 = 30;

/// Default minimum confidence re-checked after the model's own filter
pub const CONFIDENCE_THRESHOLD: f32 = 0.6;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not decode image: {0}")]
    Decode(#[from] ImageError),

    #[error("detection failed: {0}")]
    Detector(#[from] DetectorError),

    #[error("scale percent must be within 1..=100, got {0}")]
    InvalidScale(u32),
}

/// A detection in original-image pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_label: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

/// Tunables for the post-model stages
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Percentage of the original size handed to the model
    pub scale_percent: u32,
    /// Detections must score strictly above this
    pub confidence_threshold: f32,
    /// When set, only these labels are reported
    pub class_allow_list: Option<HashSet<String>>,
    /// Drop repeats of a label at the same truncated top-left corner
    pub deduplicate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale_percent: DETECTION_SCALE_PERCENT,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            class_allow_list: None,
            deduplicate: true,
        }
    }
}

impl PipelineConfig {
    /// Factor that maps model-space coordinates back to the original image
    pub fn rescale_factor(&self) -> f32 {
        100.0 / self.scale_percent as f32
    }
}

/// Result of running the pipeline over one upload
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub detections: Vec<Detection>,
    /// Original (pre-downscale) image metadata
    pub image_info: ImageInfo,
    pub processing_time_ms: u64,
}

/// Owns the model handle and applies the fixed pre/post-processing
pub struct DetectionPipeline {
    detector: Arc<dyn ObjectDetector>,
    config: PipelineConfig,
}

impl std::fmt::Debug for DetectionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DetectionPipeline {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if config.scale_percent == 0 || config.scale_percent > 100 {
            return Err(PipelineError::InvalidScale(config.scale_percent));
        }
        Ok(Self { detector, config })
    }

    /// Decode upload bytes and run detection on them
    pub fn run_bytes(&self, bytes: &[u8]) -> Result<DetectionOutcome, PipelineError> {
        let started = Instant::now();
        let (image, image_info) = decode_image_bytes(bytes)?;

        debug!(
            "Decoded image: {}x{}, {} bytes",
            image_info.width, image_info.height, image_info.size_bytes
        );

        let detections = self.run(&image)?;

        Ok(DetectionOutcome {
            detections,
            image_info,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Run detection on an already decoded image
    pub fn run(&self, image: &DynamicImage) -> Result<Vec<Detection>, PipelineError> {
        let reduced = downscale_by_percent(image, self.config.scale_percent);
        debug!(
            "Downscaled {}x{} -> {}x{} ({}%)",
            image.width(),
            image.height(),
            reduced.width(),
            reduced.height(),
            self.config.scale_percent
        );

        let raw = self.detector.detect(&reduced)?;
        Ok(postprocess(raw, &self.config))
    }
}

/// Filter, rescale and deduplicate raw model output
///
/// The allow-list and confidence check run first. Dedup keys on the label
/// plus the integer-truncated top-left corner as the model reported it,
/// keeping the first occurrence.
pub fn postprocess(raw: Vec<RawDetection>, config: &PipelineConfig) -> Vec<Detection> {
    let factor = config.rescale_factor();
    let mut seen: HashSet<(String, i64, i64)> = HashSet::new();
    let mut detections = Vec::with_capacity(raw.len());

    for det in raw {
        if !passes_filters(&det, config) {
            continue;
        }

        let model_box = det.bbox.normalized();
        if config.deduplicate {
            let key = (
                det.label.clone(),
                model_box.x1.trunc() as i64,
                model_box.y1.trunc() as i64,
            );
            if !seen.insert(key) {
                debug!("Dropping duplicate {} at ({}, {})", det.label, model_box.x1, model_box.y1);
                continue;
            }
        }

        detections.push(Detection {
            class_label: det.label,
            confidence: det.confidence,
            bounding_box: model_box.scaled(factor),
        });
    }

    detections
}

fn passes_filters(det: &RawDetection, config: &PipelineConfig) -> bool {
    if let Some(ref allowed) = config.class_allow_list {
        if !allowed.contains(&det.label) {
            return false;
        }
    }
    det.confidence > config.confidence_threshold
}
