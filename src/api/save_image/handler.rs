// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image capture endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{error, info, warn};

use super::response::{SaveImageErrorResponse, SaveImageResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::upload::read_image_field;

/// POST /save_image - Store an uploaded image in the capture directory
///
/// The bytes are written unchanged, whatever their format, under a
/// timestamped `capture_*.jpg` name.
///
/// # Errors
/// - 400 Bad Request: missing or empty `image` field
/// - 500 Internal Server Error: the file could not be written
pub async fn save_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SaveImageResponse>, SaveImageErrorResponse> {
    let bytes = read_image_field(multipart).await.map_err(|e| {
        warn!("Rejected save request: {}", e);
        e
    })?;

    let record = state.captures.save(&bytes).await.map_err(|e| {
        error!("Capture write failed: {}", e);
        ApiError::from(e)
    })?;

    info!("Saved capture {} ({} bytes)", record.filepath, bytes.len());

    Ok(Json(SaveImageResponse::from(record)))
}
