//! Scratch storage for uploads and results
//!
//! Two local directories are used purely as scratch space: uploads are
//! written to the input area just long enough for the backend to open them,
//! artifacts are written to the result area and served from there.

mod manager;
mod types;

pub use manager::StorageManager;
pub use types::InputFile;
