//! XPS Server Library
//!
//! HTTP service that converts uploaded XPS documents to PDF, PNG archives and
//! DOCX, extracts their text and metadata, and performs text replacement.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `document`: Backend-neutral document contract (traits, types, job pool)
//! - `mupdf`: MuPDF implementation of that contract
//! - `storage`: Scratch areas for uploads and results
//! - `convert`: Conversion pipelines and request orchestration
//! - `routes`: HTTP handlers

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod mupdf;
pub mod routes;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().server.max_upload_bytes;

    Router::new()
        .merge(routes::health::router())
        .merge(routes::convert::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
