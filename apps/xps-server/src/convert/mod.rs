//! Conversion engine and request orchestration
//!
//! - [`engine`]: pipelines over an opened document (PDF, images, DOCX, text, edit)
//! - [`ConversionService`]: validation, scratch storage and job scheduling
//!   around those pipelines

mod artifact;
pub mod engine;
mod service;

pub use artifact::{
    Artifact, ConversionKind, DocumentSummary, Operation, DOCX_MEDIA_TYPE, PDF_MEDIA_TYPE,
    ZIP_MEDIA_TYPE,
};
pub use service::{validate_filename, ConversionService, Upload, ACCEPTED_EXTENSION};
