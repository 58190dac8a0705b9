// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod captures;

pub use captures::{
    capture_filename, CaptureStore, SavedImageRecord, StorageError, DEFAULT_CAPTURE_DIR,
};
