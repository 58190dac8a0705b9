// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::detect::detect_handler;
use super::health::health_handler;
use super::save_image::save_image_handler;
use crate::storage::CaptureStore;
use crate::vision::DetectionPipeline;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DetectionPipeline>,
    pub captures: Arc<CaptureStore>,
    /// One permit per concurrent inference
    pub inference_slots: Arc<Semaphore>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        pipeline: DetectionPipeline,
        captures: CaptureStore,
        inference_workers: usize,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            captures: Arc::new(captures),
            inference_slots: Arc::new(Semaphore::new(inference_workers.max(1))),
            max_upload_bytes,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Object detection
        .route("/detect", post(detect_handler))
        // Capture upload
        .route("/save_image", post(save_image_handler))
        // Health check
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Detection server ready on http://{}", addr);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
