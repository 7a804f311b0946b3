//! MuPDF backend
//!
//! Implements [`DocumentBackend`](crate::document::DocumentBackend) on top of
//! the MuPDF library.
//!
//! # Thread Safety
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. Every handle is created, used
//! and dropped inside a single blocking job, so no MuPDF object crosses
//! threads.
//!
//! # Usage
//!
//! ```rust,ignore
//! use xps_server::document::DocumentBackend;
//! use xps_server::mupdf::MuPdfBackend;
//!
//! let doc = MuPdfBackend::new().open(Path::new("uploads/report.xps"))?;
//! let text = doc.extract_text(0)?;
//! ```

mod backend;
mod overlay;
mod stext;

pub use backend::{MuPdfBackend, MuPdfDocument};
pub use overlay::{apply_insertions, TextInsertion};
