//! Document abstraction
//!
//! Backend-neutral interfaces for opened paginated documents. The conversion
//! engine is written against these traits; MuPDF is one implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ConversionService                      │
//! │   (one blocking job per request, bounded by JobPool)    │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │            DocumentBackend::open(path)              │
//!   └─────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │     Box<dyn DocumentHandle>  (Opened → Closed)      │
//!   │  page_count · extract_text · rasterize · search     │
//!   │  redact_and_insert · save · metadata                │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! A handle exists only after a successful `open`. Closing consumes it, so no
//! operation is reachable on a closed document; dropping it closes it too.

mod error;
mod pool;
mod traits;
mod types;

pub use error::{DocumentError, DocumentResult, Result};
pub use pool::{default_max_jobs, JobPermit, JobPool, PoolClosed, PoolStats};
pub use traits::{DocumentBackend, DocumentHandle};
pub use types::{DocumentMetadata, RasterPage, TextColor, TextInstance, TextStyle};
