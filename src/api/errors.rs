// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use std::fmt;

use crate::storage::StorageError;
use crate::vision::PipelineError;

/// Failures surfaced at the HTTP boundary
///
/// Each endpoint renders these in its own JSON shape; see
/// `DetectErrorResponse` and `SaveImageErrorResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// No `image` field in the form
    MissingField(String),
    /// `image` field present but zero bytes
    EmptyField(String),
    /// Body is not a readable multipart form
    InvalidMultipart(String),
    /// Upload bytes are not a decodable image
    DecodeFailed(String),
    /// Model invocation or post-processing failed
    Inference(String),
    /// Capture could not be written
    Storage(String),
    /// Inference worker pool closed or task aborted
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::EmptyField(_)
            | ApiError::InvalidMultipart(_)
            | ApiError::DecodeFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) | ApiError::Storage(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message placed in the JSON body
    pub fn message(&self) -> String {
        match self {
            ApiError::MissingField(field) => format!("no '{}' file in request", field),
            ApiError::EmptyField(field) => format!("'{}' file is empty", field),
            ApiError::InvalidMultipart(msg) => format!("invalid multipart form: {}", msg),
            ApiError::DecodeFailed(msg)
            | ApiError::Inference(msg)
            | ApiError::Storage(msg)
            | ApiError::InternalError(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingField(_) | ApiError::EmptyField(_) | ApiError::InvalidMultipart(_) => {
                write!(f, "Invalid request: {}", self.message())
            }
            ApiError::DecodeFailed(msg) => write!(f, "Decode error: {}", msg),
            ApiError::Inference(msg) => write!(f, "Inference error: {}", msg),
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Decode(_) => ApiError::DecodeFailed(err.to_string()),
            PipelineError::Detector(_) | PipelineError::InvalidScale(_) => {
                ApiError::Inference(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(format!("error saving image: {}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("worker task failed: {}", err))
    }
}
