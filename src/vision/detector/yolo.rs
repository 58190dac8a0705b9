// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO object detection over ONNX Runtime
//!
//! Loads a YOLOv8-family ONNX export once and runs it on CPU with pinned
//! thread counts to keep memory bounded on small hosts.

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use tracing::{debug, info};

use super::postprocess::{decode_yolo_output, non_max_suppression, orient_output};
use super::preprocessing::preprocess_for_yolo;
use super::{
    ClassNames, DetectorError, DetectorParams, ObjectDetector, RawDetection, SessionPool,
};

/// YOLO detector backed by a pool of ONNX Runtime sessions
pub struct YoloOnnxDetector {
    /// One session per inference worker; `run` needs exclusive access
    sessions: SessionPool<Session>,
    /// Model input name
    input_name: String,
    params: DetectorParams,
    class_names: ClassNames,
}

impl std::fmt::Debug for YoloOnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloOnnxDetector")
            .field("input_name", &self.input_name)
            .field("params", &self.params)
            .field("sessions", &self.sessions.len())
            .field("classes", &self.class_names.len())
            .finish_non_exhaustive()
    }
}

impl YoloOnnxDetector {
    /// Load the detection model from an ONNX file
    ///
    /// One session is created per `params.workers` so that many inferences
    /// can run at once. Each session holds its own copy of the weights.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        params: DetectorParams,
        class_names: ClassNames,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        let workers = params.workers.max(1);
        info!(
            "Loading detection model from {} (CPU, {} session(s), {} thread(s) each)",
            model_path.display(),
            workers,
            params.threads
        );

        let sessions = (0..workers)
            .map(|_| build_session(model_path, params.threads))
            .collect::<Result<Vec<_>>>()?;

        let input_name = sessions[0]
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!("Detection model input: {}", input_name);
        info!(
            "✅ Detection model loaded ({} classes, conf {:.2}, iou {:.2}, max {})",
            class_names.len(),
            params.conf_threshold,
            params.iou_threshold,
            params.max_detections
        );

        Ok(Self {
            sessions: SessionPool::new(sessions)?,
            input_name,
            params,
            class_names,
        })
    }
}

fn build_session(model_path: &Path, threads: usize) -> Result<Session> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(threads)
        .context("Failed to set intra threads")?
        .with_inter_threads(threads)
        .context("Failed to set inter threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load detection model from {}", model_path.display()))
}

impl ObjectDetector for YoloOnnxDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, DetectorError> {
        let (width, height) = image.dimensions();
        let (input, letterbox) = preprocess_for_yolo(image, self.params.input_size);

        let input_value =
            Value::from_array(input).map_err(|e| DetectorError::Inference(e.to_string()))?;

        let output = {
            let mut session = self.sessions.acquire()?;

            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .map_err(|e| DetectorError::Inference(e.to_string()))?;

            let tensor = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

            orient_output(tensor.view(), self.class_names.len())?
        };

        let candidates = decode_yolo_output(output.view(), self.params.conf_threshold, &self.class_names);
        let candidate_count = candidates.len();

        let detections: Vec<RawDetection> = non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        )
        .into_iter()
        .map(|d| RawDetection {
            bbox: letterbox.map_to_source(d.bbox),
            ..d
        })
        .collect();

        debug!(
            "{}x{} image: {} candidates, {} after NMS",
            width,
            height,
            candidate_count,
            detections.len()
        );

        Ok(detections)
    }
}
