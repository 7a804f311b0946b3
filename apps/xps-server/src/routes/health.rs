//! Welcome and health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::PoolStats;
use crate::state::AppState;

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub backend: &'static str,
    pub started_at: DateTime<Utc>,
    pub jobs: PoolStats,
    /// Fraction of job slots in use
    pub utilization: f64,
}

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the XPS API. POST a .xps file to /convert/{pdf|images|docx}, /read-xps, /preview-all or /edit-xps.",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let service = state.service();
    let jobs = service.pool().stats();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "xps-server",
        backend: service.backend_name(),
        started_at: state.started_at(),
        utilization: jobs.utilization(),
        jobs,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
}
