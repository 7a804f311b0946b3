//! Application state management

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::convert::ConversionService;
use crate::document::{DocumentBackend, JobPool};
use crate::storage::StorageManager;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to prepare scratch directories: {0}")]
    Storage(#[from] std::io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    service: ConversionService,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create the state: scratch directories, job pool and conversion service
    pub fn new(config: Config, backend: Arc<dyn DocumentBackend>) -> Result<Self, StateError> {
        let storage = StorageManager::new(&config.storage)?;
        let pool = JobPool::new(config.jobs.max_concurrent);

        tracing::info!(
            "Backend: {} ({} concurrent job(s))",
            backend.name(),
            pool.stats().max_jobs
        );

        let service = ConversionService::new(backend, storage, pool);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                service,
                started_at: Utc::now(),
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the conversion service
    pub fn service(&self) -> &ConversionService {
        &self.inner.service
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }
}
