// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every tunable lives here with its default. Values come from command-line
//! flags, falling back to environment variables (a `.env` file is loaded by
//! `main` first), falling back to the defaults below.

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::storage::DEFAULT_CAPTURE_DIR;
use crate::vision::{DetectorParams, PipelineConfig, CONFIDENCE_THRESHOLD, DETECTION_SCALE_PERCENT};

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_MODEL_PATH: &str = "models/yolov8n.onnx";
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_DETECTIONS: usize = 5;
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Object detection capture service
#[derive(Parser, Debug, Clone)]
#[command(name = "fabstir-detect-node")]
#[command(about = "HTTP object detection and image capture service", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// ONNX detection model weights, loaded once at startup
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Newline-separated class labels (defaults to the COCO table)
    #[arg(long, env = "CLASS_NAMES_PATH")]
    pub class_names_path: Option<PathBuf>,

    /// Directory receiving /save_image uploads
    #[arg(long, env = "CAPTURE_DIR", default_value = DEFAULT_CAPTURE_DIR)]
    pub capture_dir: PathBuf,

    /// Percentage of the original size handed to the model
    #[arg(long = "scale-percent", env = "DETECTION_SCALE_PERCENT", default_value_t = DETECTION_SCALE_PERCENT)]
    pub scale_percent: u32,

    /// Minimum detection confidence (0.0-1.0)
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = CONFIDENCE_THRESHOLD)]
    pub confidence_threshold: f32,

    /// NMS IoU threshold (0.0-1.0)
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = DEFAULT_IOU_THRESHOLD)]
    pub iou_threshold: f32,

    /// Maximum detections per image
    #[arg(long, env = "MAX_DETECTIONS", default_value_t = DEFAULT_MAX_DETECTIONS)]
    pub max_detections: usize,

    /// Square model input size in pixels
    #[arg(long, env = "MODEL_INPUT_SIZE", default_value_t = DEFAULT_MODEL_INPUT_SIZE)]
    pub model_input_size: u32,

    /// Comma-separated labels to report (empty reports every class)
    #[arg(long, env = "CLASS_ALLOW_LIST", value_delimiter = ',')]
    pub class_allow_list: Vec<String>,

    /// Drop repeated labels at the same truncated top-left corner
    #[arg(long = "deduplicate", env = "DEDUPLICATE_DETECTIONS", default_value_t = true, action = ArgAction::Set)]
    pub deduplicate: bool,

    /// ONNX Runtime intra/inter-op threads
    #[arg(long, env = "MODEL_THREADS", default_value_t = 1)]
    pub model_threads: usize,

    /// Inferences allowed to run at the same time (one model session each)
    #[arg(long, env = "INFERENCE_WORKERS", default_value_t = 1)]
    pub inference_workers: usize,

    /// Request body limit for uploads
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            class_names_path: None,
            capture_dir: PathBuf::from(DEFAULT_CAPTURE_DIR),
            scale_percent: DETECTION_SCALE_PERCENT,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            model_input_size: DEFAULT_MODEL_INPUT_SIZE,
            class_allow_list: Vec::new(),
            deduplicate: true,
            model_threads: 1,
            inference_workers: 1,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scale_percent == 0 || self.scale_percent > 100 {
            bail!("DETECTION_SCALE_PERCENT must be within 1..=100, got {}", self.scale_percent);
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            bail!("CONFIDENCE_THRESHOLD must be within 0.0..=1.0, got {}", self.confidence_threshold);
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            bail!("IOU_THRESHOLD must be within 0.0..=1.0, got {}", self.iou_threshold);
        }
        if self.max_detections == 0 {
            bail!("MAX_DETECTIONS must be at least 1");
        }
        if self.model_input_size == 0 || self.model_input_size % 32 != 0 {
            bail!("MODEL_INPUT_SIZE must be a positive multiple of 32, got {}", self.model_input_size);
        }
        if self.model_threads == 0 {
            bail!("MODEL_THREADS must be at least 1");
        }
        if self.inference_workers == 0 {
            bail!("INFERENCE_WORKERS must be at least 1");
        }
        if self.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be at least 1");
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse::<SocketAddr>()?;
        Ok(addr)
    }

    /// Allow-list as a set, `None` when every class is reported
    pub fn allow_list(&self) -> Option<HashSet<String>> {
        let labels: HashSet<String> = self
            .class_allow_list
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect();

        if labels.is_empty() {
            None
        } else {
            Some(labels)
        }
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            input_size: self.model_input_size,
            conf_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
            threads: self.model_threads,
            workers: self.inference_workers,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            scale_percent: self.scale_percent,
            confidence_threshold: self.confidence_threshold,
            class_allow_list: self.allow_list(),
            deduplicate: self.deduplicate,
        }
    }
}
