// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::Json;
use serde::{Deserialize, Serialize};

pub const HEALTHY: &str = "healthy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// GET /health - Liveness check
///
/// The model is loaded before the listener binds, so a reachable server
/// is always ready.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HEALTHY.to_string(),
        message: "Server is running".to_string(),
    })
}
