// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir detection node

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "object-detection",
    "onnx-cpu",
    "area-downscale",
    "class-allow-list",
    "detection-dedup",
    "image-capture",
];

/// Get version information as a formatted string
pub fn get_version_info() -> String {
    format!("Fabstir Detect Node v{} (features: {})", VERSION, FEATURES.join(", "))
}
