// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class id to label lookup

use anyhow::{Context, Result};
use std::path::Path;

/// The 80 COCO classes stock YOLOv8 weights are trained on, in id order
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Ordered class labels; position is the model's class id
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn coco() -> Self {
        Self::new(COCO_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    /// Parse one label per line, line index = class id
    ///
    /// Trailing blank lines are dropped. A blank line inside the table keeps
    /// its id and gets the synthetic `class_<id>` label so later ids do not
    /// shift.
    pub fn parse(contents: &str) -> Self {
        let mut lines: Vec<&str> = contents.lines().map(str::trim).collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        Self::new(
            lines
                .into_iter()
                .enumerate()
                .map(|(id, line)| {
                    if line.is_empty() {
                        synthetic_label(id)
                    } else {
                        line.to_string()
                    }
                })
                .collect(),
        )
    }

    /// Read a labels file, or fall back to COCO when no path is configured
    ///
    /// Custom-trained models carry their own class list, so a configured
    /// file that is missing or empty is an error rather than a silent
    /// fallback.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::coco());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read class names from {}", path.display()))?;
        let names = Self::parse(&contents);
        if names.is_empty() {
            anyhow::bail!("Class names file {} has no labels", path.display());
        }

        tracing::info!("Loaded {} class names from {}", names.len(), path.display());
        Ok(names)
    }

    /// Label for `class_id`; ids past the table get a synthetic `class_<id>`
    pub fn label(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| synthetic_label(class_id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn synthetic_label(class_id: usize) -> String {
    format!("class_{}", class_id)
}

impl Default for ClassNames {
    fn default() -> Self {
        Self::coco()
    }
}
