// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod health;
pub mod http_server;
pub mod save_image;
pub mod upload;

pub use detect::{detect_handler, DetectResponse, DetectionItem};
pub use errors::ApiError;
pub use health::{health_handler, HealthResponse};
pub use http_server::{create_app, start_server, AppState};
pub use save_image::{save_image_handler, SaveImageResponse};
pub use upload::{read_image_field, IMAGE_FIELD};
