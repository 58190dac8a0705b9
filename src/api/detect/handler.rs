// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, error, info, warn};

use super::response::{DetectErrorResponse, DetectResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::upload::read_image_field;

/// POST /detect - Detect objects in an uploaded image
///
/// Accepts a multipart form with an `image` file field. The image is
/// downscaled before inference and the returned boxes are mapped back to
/// the original image's pixel space.
///
/// # Response
/// - `status`: "success"
/// - `detections`: `{class, confidence, bbox: [x1, y1, x2, y2]}` entries
/// - `image_size`: original width and height
///
/// # Errors
/// - 400 Bad Request: missing/empty `image` field, or bytes that do not decode
/// - 500 Internal Server Error: inference failed
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, DetectErrorResponse> {
    let bytes = read_image_field(multipart).await.map_err(|e| {
        warn!("Rejected detect request: {}", e);
        e
    })?;

    debug!("Detect request: {} bytes", bytes.len());

    // Bounded inference concurrency; extra requests wait here
    let permit = state
        .inference_slots
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ApiError::InternalError(format!("inference pool closed: {}", e)))?;

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        pipeline.run_bytes(&bytes)
    })
    .await
    .map_err(|e| {
        error!("Inference task aborted: {}", e);
        ApiError::from(e)
    })?
    .map_err(|e| {
        let api_error = ApiError::from(e);
        if api_error.is_client_error() {
            warn!("Detect failed: {}", api_error);
        } else {
            error!("Detect failed: {}", api_error);
        }
        api_error
    })?;

    info!(
        "Detection complete: {} objects in {}x{} image, {}ms",
        outcome.detections.len(),
        outcome.image_info.width,
        outcome.image_info.height,
        outcome.processing_time_ms
    );

    Ok(Json(DetectResponse::from_outcome(outcome)))
}
