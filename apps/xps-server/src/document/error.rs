//! Document error types
//!
//! Failures raised by a document backend while a request's pipeline runs.
//! Every variant ends up as a 500-class response; the display text becomes
//! the detail part of the user-facing message.

use thiserror::Error;

/// Document backend error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file is not a readable document of a supported format
    #[error("cannot open document: {0}")]
    Open(String),

    /// Page index outside `0..page_count`
    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// Failed to rasterize a page
    #[error("render error: {0}")]
    Render(String),

    /// Failed to extract page text
    #[error("text extraction error: {0}")]
    TextExtraction(String),

    /// Failed to search page text
    #[error("search error: {0}")]
    Search(String),

    /// Failed to redact or insert text
    #[error("edit error: {0}")]
    Edit(String),

    /// Failed to persist the document
    #[error("save error: {0}")]
    Save(String),

    /// PNG encoding error
    #[error("image error: {0}")]
    Image(String),

    /// ZIP archive error
    #[error("archive error: {0}")]
    Archive(String),

    /// Word document export error
    #[error("docx error: {0}")]
    Docx(String),

    /// IO error (std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// MuPDF error not attributed to a specific operation
    #[error("MuPDF error: {0}")]
    Backend(String),

    /// PDF object model error
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result (used by backend and engine code)
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Backend(err.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::Pdf(err.to_string())
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::Image(err.to_string())
    }
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(err: zip::result::ZipError) -> Self {
        DocumentError::Archive(err.to_string())
    }
}
