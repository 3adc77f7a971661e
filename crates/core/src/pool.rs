//! Bounded worker pool shared by every conversion and copy job.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Error type for permit acquisition.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The underlying semaphore was closed.
    #[error("Worker pool is closed")]
    Closed,

    /// The run was cancelled while waiting for a permit.
    #[error("Cancelled while waiting for a worker")]
    Cancelled,
}

/// Status of the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Number of permits currently held.
    pub active_jobs: usize,
    /// Maximum concurrent jobs.
    pub max_concurrent: usize,
    /// Number of tasks waiting for a permit.
    pub queued_jobs: usize,
    /// Highest number of permits held at once.
    pub peak_active: usize,
    /// Units finished successfully.
    pub total_processed: u64,
    /// Units that failed.
    pub total_failed: u64,
}

/// Tracks statistics for the pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    peak: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            max_concurrent,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            peak_active: self.peak.load(Ordering::Relaxed) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Counting semaphore with capacity equal to the configured worker count.
///
/// Cloning is cheap; clones share permits and statistics.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            stats: Arc::new(PoolStats::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Waits for a permit, giving up when `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<PoolPermit, PoolError> {
        if cancel.is_cancelled() {
            return Err(PoolError::Cancelled);
        }

        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PoolError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => permit.map_err(|_| PoolError::Closed),
        };
        self.stats.queued.fetch_sub(1, Ordering::Relaxed);

        let permit = acquired?;
        let active = self.stats.active.fetch_add(1, Ordering::Relaxed) + 1;
        self.stats.peak.fetch_max(active, Ordering::Relaxed);

        Ok(PoolPermit {
            _permit: permit,
            stats: self.stats.clone(),
        })
    }

    /// Current pool status.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(self.capacity)
    }
}

/// A held worker slot. Released on drop.
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
    stats: Arc<PoolStats>,
}

impl PoolPermit {
    /// Records the unit's outcome and releases the slot.
    pub fn finish(self, success: bool) {
        let counter = if success {
            &self.stats.total_processed
        } else {
            &self.stats.total_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::Relaxed);
    }
}
