// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage for the single most recent firmware upload.
//!
//! Each upload overwrites the same file in place. There is no checksum and no
//! atomic swap, so a fetch racing an upload can observe a partial image.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::RelayError;

/// Fixed file name inside the firmware directory.
pub const FIRMWARE_FILE: &str = "firmware.bin";

/// Reference to an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareHandle {
    pub path: PathBuf,
    pub bytes: usize,
}

pub struct FirmwareStore {
    dir: PathBuf,
    current: Mutex<Option<FirmwareHandle>>,
}

impl FirmwareStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), current: Mutex::new(None) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Handle of the last accepted upload, if any since startup.
    pub fn current(&self) -> Option<FirmwareHandle> {
        self.current.lock().clone()
    }

    /// Write `blob` over the stored image and return its handle.
    pub async fn upload(&self, blob: &[u8]) -> Result<FirmwareHandle, RelayError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            tracing::warn!(dir = %self.dir.display(), err = %e, "failed to create firmware dir");
            RelayError::Internal
        })?;

        let path = self.dir.join(FIRMWARE_FILE);
        tokio::fs::write(&path, blob).await.map_err(|e| {
            tracing::warn!(path = %path.display(), err = %e, "failed to write firmware");
            RelayError::Internal
        })?;

        let handle = FirmwareHandle { path, bytes: blob.len() };
        *self.current.lock() = Some(handle.clone());
        tracing::info!(bytes = handle.bytes, path = %handle.path.display(), "firmware stored");
        Ok(handle)
    }

    /// Read the blob behind `handle`.
    pub async fn fetch(&self, handle: &FirmwareHandle) -> Result<Vec<u8>, RelayError> {
        match tokio::fs::read(&handle.path).await {
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RelayError::NoFirmwareAvailable)
            }
            Err(e) => {
                tracing::warn!(path = %handle.path.display(), err = %e, "failed to read firmware");
                Err(RelayError::Internal)
            }
        }
    }

    /// Fetch the current image, or `NoFirmwareAvailable` if nothing was uploaded.
    pub async fn fetch_current(&self) -> Result<Vec<u8>, RelayError> {
        let handle = self.current().ok_or(RelayError::NoFirmwareAvailable)?;
        self.fetch(&handle).await
    }
}

#[cfg(test)]
#[path = "firmware_tests.rs"]
mod tests;
