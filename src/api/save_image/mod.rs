// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image capture API endpoint module
//!
//! Provides POST /save_image for persisting uploads to disk.

pub mod handler;
pub mod response;

pub use handler::save_image_handler;
pub use response::{SaveImageErrorResponse, SaveImageResponse};
