//! Scratch path allocation and upload materialization

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::StorageConfig;

use super::types::{remove_file_if_exists, InputFile};

/// Allocates collision-free paths in the input and result areas.
///
/// Names come from random UUIDs, so concurrent requests never need to
/// coordinate.
#[derive(Debug, Clone)]
pub struct StorageManager {
    upload_dir: PathBuf,
    result_dir: PathBuf,
}

impl StorageManager {
    /// Create the manager and both scratch directories
    pub fn new(config: &StorageConfig) -> io::Result<Self> {
        std::fs::create_dir_all(&config.upload_dir)?;
        std::fs::create_dir_all(&config.result_dir)?;

        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            result_dir: config.result_dir.clone(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Fresh path in the input area: `{uuid}{extension}`
    pub fn allocate_input_path(&self, extension: &str) -> PathBuf {
        let (path, _) = Self::allocate_in(&self.upload_dir, "", extension);
        path
    }

    /// Fresh path in the result area plus its file name for response headers
    pub fn allocate_output_path(&self, extension: &str) -> (PathBuf, String) {
        Self::allocate_in(&self.result_dir, "", extension)
    }

    /// Like [`allocate_output_path`](Self::allocate_output_path) with a name prefix,
    /// e.g. `edited_{uuid}.pdf`
    pub fn allocate_named_output(&self, prefix: &str, extension: &str) -> (PathBuf, String) {
        Self::allocate_in(&self.result_dir, prefix, extension)
    }

    fn allocate_in(dir: &Path, prefix: &str, extension: &str) -> (PathBuf, String) {
        let filename = format!("{}{}{}", prefix, Uuid::new_v4(), normalize_extension(extension));
        (dir.join(&filename), filename)
    }

    /// Write the full upload to `path`, then flush and sync it.
    ///
    /// The backend needs a fully materialized file, so this completes before
    /// any open is attempted.
    pub async fn write_and_close(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Idempotent deletion
    pub fn remove(&self, path: &Path) -> io::Result<()> {
        remove_file_if_exists(path)
    }

    /// Store an upload in the input area.
    ///
    /// The returned guard deletes the file when dropped. A failed write leaves
    /// nothing behind.
    pub async fn store_upload(&self, extension: &str, bytes: &[u8]) -> io::Result<InputFile> {
        let input = InputFile::new(self.allocate_input_path(extension));

        // On error the guard is dropped here and removes any partial file
        self.write_and_close(input.path(), bytes).await?;

        tracing::debug!("Stored upload {} ({} bytes)", input.path().display(), bytes.len());
        Ok(input)
    }
}

/// Ensure a non-empty extension starts with a dot
fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
