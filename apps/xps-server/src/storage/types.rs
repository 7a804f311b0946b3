//! Storage types

use std::io;
use std::path::{Path, PathBuf};

/// An uploaded document materialized in the input area.
///
/// Owned exclusively by the request that stored it. The file is deleted
/// exactly once, when the guard is dropped, on every exit path.
#[derive(Debug)]
pub struct InputFile {
    path: PathBuf,
}

impl InputFile {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location in the input area
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InputFile {
    fn drop(&mut self) {
        match remove_file_if_exists(&self.path) {
            Ok(()) => tracing::debug!("Removed input file {}", self.path.display()),
            Err(e) => tracing::warn!("Failed to remove input file {}: {}", self.path.display(), e),
        }
    }
}

/// Delete a file, treating an already-missing file as success
pub(super) fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
