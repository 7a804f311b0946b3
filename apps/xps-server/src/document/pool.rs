//! Backend Job Concurrency Control
//!
//! Every request runs its document pipeline as one blocking job. This pool
//! bounds how many of those jobs execute at once and keeps counters for the
//! health endpoint.
//!
//! # Design
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          JobPool                               │
//! │                                                                │
//! │  acquire().await → JobPermit → spawn_blocking(job) → drop()   │
//! │        ↑                                        ↓              │
//! │  [waits for slot]                       [active_count--]       │
//! │  [started++, active++]                  [completed++]          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Waiting for a slot is asynchronous, so a saturated pool never blocks the
//! runtime's worker threads. The permit is moved into the blocking closure and
//! is released when the job finishes, even if the request was abandoned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The pool's semaphore was closed
#[derive(Debug, Error)]
#[error("job pool is closed")]
pub struct PoolClosed;

/// Bounded pool of backend job slots
#[derive(Clone)]
pub struct JobPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    slots: Arc<Semaphore>,
    max_jobs: usize,
    /// Jobs that obtained a slot
    started: AtomicUsize,
    /// Jobs currently holding a slot
    active: AtomicUsize,
    /// Jobs that released their slot
    completed: AtomicUsize,
}

impl JobPool {
    /// Create a pool allowing `max_jobs` concurrent jobs (at least one)
    pub fn new(max_jobs: usize) -> Self {
        let max_jobs = max_jobs.max(1);
        Self {
            inner: Arc::new(PoolInner {
                slots: Arc::new(Semaphore::new(max_jobs)),
                max_jobs,
                started: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
            }),
        }
    }

    /// Wait for a free slot.
    ///
    /// Returns a RAII guard that frees the slot on drop.
    pub async fn acquire(&self) -> Result<JobPermit, PoolClosed> {
        let permit = Arc::clone(&self.inner.slots)
            .acquire_owned()
            .await
            .map_err(|_| PoolClosed)?;

        self.inner.started.fetch_add(1, Ordering::Relaxed);
        self.inner.active.fetch_add(1, Ordering::Relaxed);

        Ok(JobPermit {
            _permit: permit,
            pool: Arc::clone(&self.inner),
        })
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            started: self.inner.started.load(Ordering::Relaxed),
            active: self.inner.active.load(Ordering::Relaxed),
            completed: self.inner.completed.load(Ordering::Relaxed),
            max_jobs: self.inner.max_jobs,
        }
    }
}

/// Number of jobs to allow when nothing is configured
pub fn default_max_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// RAII guard - frees the job slot on drop
pub struct JobPermit {
    _permit: OwnedSemaphorePermit,
    pool: Arc<PoolInner>,
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.pool.active.fetch_sub(1, Ordering::Relaxed);
        self.pool.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pool statistics
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Jobs ever started
    pub started: usize,
    /// Jobs currently running
    pub active: usize,
    /// Jobs finished (successfully or not)
    pub completed: usize,
    /// Maximum concurrent jobs
    pub max_jobs: usize,
}

impl PoolStats {
    /// Fraction of slots in use (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.max_jobs == 0 {
            return 0.0;
        }
        self.active as f64 / self.max_jobs as f64
    }
}
