//! Conversion requests and their results

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::DocumentMetadata;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const ZIP_MEDIA_TYPE: &str = "application/zip";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Target format of `POST /convert/{conversion_type}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionKind {
    Pdf,
    Images,
    Docx,
}

impl ConversionKind {
    pub const ALL: [ConversionKind; 3] =
        [ConversionKind::Pdf, ConversionKind::Images, ConversionKind::Docx];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::Pdf => "pdf",
            ConversionKind::Images => "images",
            ConversionKind::Docx => "docx",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ConversionKind::Pdf => PDF_MEDIA_TYPE,
            ConversionKind::Images => ZIP_MEDIA_TYPE,
            ConversionKind::Docx => DOCX_MEDIA_TYPE,
        }
    }

    /// Extension of the produced file
    pub fn extension(&self) -> &'static str {
        match self {
            ConversionKind::Pdf => ".pdf",
            ConversionKind::Images => ".zip",
            ConversionKind::Docx => ".docx",
        }
    }

    /// Message for an unknown conversion type
    pub fn unsupported_message() -> String {
        let allowed: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
        format!("Unsupported conversion. Allowed: {}", allowed.join(", "))
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionKind {
    type Err = String;

    /// Exact, case-sensitive match on the route segment
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(Self::unsupported_message)
    }
}

/// Request-level operation, used for failure messages and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Convert(ConversionKind),
    Read,
    Preview,
    Edit,
}

impl Operation {
    /// Prefix of the user-facing message when the pipeline fails
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::Convert(_) => "Conversion failed",
            Operation::Read => "Failed to read XPS",
            Operation::Preview => "Failed to generate preview",
            Operation::Edit => "Failed to edit XPS",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Convert(kind) => write!(f, "convert/{}", kind),
            Operation::Read => f.write_str("read-xps"),
            Operation::Preview => f.write_str("preview-all"),
            Operation::Edit => f.write_str("edit-xps"),
        }
    }
}

/// Text and metadata of a whole document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub metadata: DocumentMetadata,
    pub page_count: usize,
    pub text: String,
}

/// Output of a successful pipeline
#[derive(Debug)]
pub enum Artifact {
    /// A file in the result area
    File {
        path: PathBuf,
        filename: String,
        media_type: &'static str,
    },
    /// An in-memory ZIP archive
    Archive { bytes: Vec<u8>, filename: String },
    Json(DocumentSummary),
}

impl Artifact {
    pub fn media_type(&self) -> &'static str {
        match self {
            Artifact::File { media_type, .. } => *media_type,
            Artifact::Archive { .. } => ZIP_MEDIA_TYPE,
            Artifact::Json(_) => "application/json",
        }
    }
}
