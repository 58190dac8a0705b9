// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction shared by the image endpoints

use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use bytes::Bytes;
use tracing::debug;

use super::errors::ApiError;

/// Form field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image";

/// Pull the bytes of the first `image` field out of a multipart body
///
/// Other fields are skipped. A body that is not multipart at all is
/// reported the same way as a malformed one so every failure stays JSON.
pub async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Bytes, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidMultipart(e.to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidMultipart(e.to_string()))?;

        if data.is_empty() {
            return Err(ApiError::EmptyField(IMAGE_FIELD.to_string()));
        }

        debug!("Received upload {:?}: {} bytes", file_name, data.len());
        return Ok(data);
    }

    Err(ApiError::MissingField(IMAGE_FIELD.to_string()))
}
