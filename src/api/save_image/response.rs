// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Save-image response types

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::storage::SavedImageRecord;

pub const SAVED_MESSAGE: &str = "Image saved successfully";

/// Body of a successful POST /save_image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveImageResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    /// Path of the written file
    pub filepath: String,
}

impl From<SavedImageRecord> for SaveImageResponse {
    fn from(record: SavedImageRecord) -> Self {
        Self {
            success: true,
            message: SAVED_MESSAGE.to_string(),
            filename: record.filename,
            filepath: record.filepath,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveImageErrorBody {
    pub success: bool,
    pub message: String,
}

/// Renders an [`ApiError`] as `{success: false, message}`
#[derive(Debug)]
pub struct SaveImageErrorResponse(pub ApiError);

impl From<ApiError> for SaveImageErrorResponse {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SaveImageErrorResponse {
    fn into_response(self) -> Response {
        let body = SaveImageErrorBody {
            success: false,
            message: self.0.message(),
        };
        (self.0.status_code(), Json(body)).into_response()
    }
}
