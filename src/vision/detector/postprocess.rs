// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO output decoding and non-maximum suppression
//!
//! YOLOv8-style heads emit one tensor of shape `[1, 4 + num_classes, N]`:
//! rows 0..4 are `cx, cy, w, h` in model input pixels and the remaining rows
//! are per-class scores (no separate objectness). Some exports transpose the
//! last two axes, which `orient_output` undoes.

use ndarray::{Array2, ArrayView2, ArrayViewD, Axis, Ix2};
use std::cmp::Ordering;

use super::{BoundingBox, ClassNames, DetectorError, RawDetection};

/// Number of box coordinates preceding the class scores
const BOX_ROWS: usize = 4;

/// Bring a raw model output into `[4 + num_classes, N]` layout
///
/// The feature axis is the one of length `4 + num_classes`. When the label
/// table does not match the model, the longer axis is taken as the candidate
/// axis, which holds for stock exports at the default input size.
pub fn orient_output(
    output: ArrayViewD<f32>,
    num_classes: usize,
) -> Result<Array2<f32>, DetectorError> {
    let shape = output.shape().to_vec();
    let view = match shape.len() {
        3 if shape[0] == 1 => output.index_axis_move(Axis(0), 0),
        2 => output,
        _ => {
            return Err(DetectorError::InvalidOutput(format!(
                "expected [1, features, candidates], got {:?}",
                shape
            )))
        }
    };

    let view = view
        .into_dimensionality::<Ix2>()
        .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

    let features = BOX_ROWS + num_classes;
    let (rows, cols) = (view.shape()[0], view.shape()[1]);
    let transposed = if rows == features {
        false
    } else if cols == features {
        true
    } else {
        rows > cols
    };

    let oriented = if transposed { view.reversed_axes() } else { view };

    if oriented.shape()[0] <= BOX_ROWS {
        return Err(DetectorError::InvalidOutput(format!(
            "output has {} rows, need at least {} (box + one class)",
            oriented.shape()[0],
            BOX_ROWS + 1
        )));
    }

    Ok(oriented.to_owned())
}

/// Decode candidates whose best class score exceeds `conf_threshold`
///
/// Boxes stay in model input space.
pub fn decode_yolo_output(
    output: ArrayView2<f32>,
    conf_threshold: f32,
    class_names: &ClassNames,
) -> Vec<RawDetection> {
    let num_candidates = output.shape()[1];
    let mut detections = Vec::new();

    for i in 0..num_candidates {
        let column = output.column(i);
        let best = column
            .iter()
            .skip(BOX_ROWS)
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let Some((class_id, &score)) = best else {
            continue;
        };

        if !(score > conf_threshold) {
            continue;
        }

        let bbox = BoundingBox::from_center(column[0], column[1], column[2], column[3]);
        detections.push(RawDetection {
            class_id,
            label: class_names.label(class_id),
            confidence: score,
            bbox,
        });
    }

    detections
}

/// Per-class greedy NMS, highest confidence first, capped at `max_detections`
pub fn non_max_suppression(
    mut detections: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in detections {
        if kept.len() >= max_detections {
            break;
        }

        let overlaps = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }

    kept
}
