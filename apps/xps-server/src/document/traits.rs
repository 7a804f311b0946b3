//! Document traits
//!
//! The contract a document backend must satisfy. The conversion engine only
//! talks to these traits, never to MuPDF directly.

use std::path::Path;

use super::error::Result;
use super::types::{DocumentMetadata, RasterPage, TextInstance, TextStyle};

/// Opens documents from materialized files.
///
/// Shared by all requests; implementations hold no per-document state.
pub trait DocumentBackend: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Open and parse the document at `path`.
    ///
    /// Fails with [`DocumentError::Open`](super::DocumentError::Open) when the
    /// file is unreadable or not a supported document. Nothing is retained on
    /// failure.
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>>;
}

/// An opened, paginated document.
///
/// Page count and page content are fixed at open time. A handle belongs to a
/// single request and is used from a single thread. Backend resources are
/// released when the handle is closed or dropped, whichever comes first.
pub trait DocumentHandle {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Information dictionary
    fn metadata(&self) -> Result<DocumentMetadata>;

    /// Plain text of a page; empty when the page carries no text
    fn extract_text(&self, index: usize) -> Result<String>;

    /// Render a page at the backend's default resolution
    fn rasterize(&self, index: usize) -> Result<RasterPage>;

    /// Case-sensitive literal search, in reading order
    fn search(&self, index: usize, needle: &str) -> Result<Vec<TextInstance>>;

    /// Remove everything intersecting `instance`, then draw `text` with its
    /// origin at the instance's top-left corner. Destructive.
    fn redact_and_insert(
        &mut self,
        index: usize,
        instance: &TextInstance,
        text: &str,
        style: &TextStyle,
    ) -> Result<()>;

    /// Write the current state, edits included, as a PDF file
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Release backend resources
    fn close(self: Box<Self>) {}
}
