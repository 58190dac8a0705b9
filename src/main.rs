// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use fabstir_detect_node::{
    api::{start_server, AppState},
    config::ServiceConfig,
    storage::CaptureStore,
    version,
    vision::{ClassNames, DetectionPipeline, YoloOnnxDetector},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Log filter applied when `RUST_LOG` is unset or unparsable
const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let config = ServiceConfig::parse();

    if let Err(e) = run(config).await {
        error!("Startup failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServiceConfig) -> Result<()> {
    info!("Starting {}", version::get_version_info());
    config.validate().context("Invalid configuration")?;
    let addr = config.listen_addr()?;

    let class_names = ClassNames::load(config.class_names_path.as_deref())?;
    info!("Loaded {} class labels", class_names.len());

    info!("Loading detection model from {}", config.model_path.display());
    let detector = YoloOnnxDetector::load(&config.model_path, config.detector_params(), class_names)
        .with_context(|| format!("Failed to load model {}", config.model_path.display()))?;
    info!("Model loaded");

    let pipeline = DetectionPipeline::new(Arc::new(detector), config.pipeline_config())?;

    let captures = CaptureStore::new(&config.capture_dir);
    captures.ensure_dir().await?;
    info!("Capture directory: {}", captures.dir().display());

    info!(
        "Scale {}%, confidence > {}, {} inference worker(s), {} ORT thread(s)",
        config.scale_percent,
        config.confidence_threshold,
        config.inference_workers,
        config.model_threads
    );

    let state = AppState::new(
        pipeline,
        captures,
        config.inference_workers,
        config.max_upload_bytes,
    );

    start_server(state, addr).await
}
