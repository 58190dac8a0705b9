// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::vision::{Detection, DetectionOutcome};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// One detected object, coordinates in original-image pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionItem {
    /// Class label
    pub class: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// `[x1, y1, x2, y2]`
    pub bbox: [f32; 4],
}

impl From<Detection> for DetectionItem {
    fn from(d: Detection) -> Self {
        Self {
            class: d.class_label,
            confidence: d.confidence,
            bbox: d.bounding_box.to_array(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Body of a successful POST /detect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    /// Always "success"
    pub status: String,
    pub detections: Vec<DetectionItem>,
    /// Dimensions of the uploaded image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
}

impl DetectResponse {
    pub fn from_outcome(outcome: DetectionOutcome) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            image_size: Some(ImageSize {
                width: outcome.image_info.width,
                height: outcome.image_info.height,
            }),
            detections: outcome.detections.into_iter().map(DetectionItem::from).collect(),
        }
    }
}

/// Body of a failed POST /detect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectErrorBody {
    /// Always "error"
    pub status: String,
    pub message: String,
}

/// Renders an [`ApiError`] as `{status: "error", message}`
#[derive(Debug)]
pub struct DetectErrorResponse(pub ApiError);

impl From<ApiError> for DetectErrorResponse {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for DetectErrorResponse {
    fn into_response(self) -> Response {
        let body = DetectErrorBody {
            status: STATUS_ERROR.to_string(),
            message: self.0.message(),
        };
        (self.0.status_code(), Json(body)).into_response()
    }
}
