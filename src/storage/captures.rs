// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Capture directory for uploaded images
//!
//! Uploads are written verbatim, no re-encoding, as
//! `capture_<YYYYMMDD_HHMMSS>.jpg`. The timestamp has one-second
//! resolution, so two uploads within the same second share a filename and
//! the later write replaces the earlier one. Nothing is ever deleted.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default capture directory, relative to the working directory
pub const DEFAULT_CAPTURE_DIR: &str = "captured_images";

/// Filename prefix for saved captures
pub const CAPTURE_PREFIX: &str = "capture_";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create capture directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where a capture landed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedImageRecord {
    pub filename: String,
    pub filepath: String,
}

/// Build the capture filename for a timestamp
pub fn capture_filename<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}.jpg", CAPTURE_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

/// Fixed directory that receives saved uploads
#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the capture directory if absent (idempotent)
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.dir.display().to_string(),
                source,
            })
    }

    /// Save upload bytes under the current local timestamp
    pub async fn save(&self, bytes: &[u8]) -> Result<SavedImageRecord, StorageError> {
        self.save_at(bytes, Local::now()).await
    }

    /// Save upload bytes under an explicit timestamp
    pub async fn save_at<Tz: TimeZone>(
        &self,
        bytes: &[u8],
        at: DateTime<Tz>,
    ) -> Result<SavedImageRecord, StorageError>
    where
        Tz::Offset: std::fmt::Display,
    {
        // The directory may have been removed since startup
        self.ensure_dir().await?;

        let filename = capture_filename(&at);
        let path = self.dir.join(&filename);
        let filepath = path.display().to_string();

        debug!("Writing {} bytes to {}", bytes.len(), filepath);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: filepath.clone(),
                source,
            })?;

        debug!("Image saved to {}", filepath);
        Ok(SavedImageRecord { filename, filepath })
    }
}

impl Default for CaptureStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_DIR)
    }
}
