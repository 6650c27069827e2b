//! Bounded pool for blocking provider calls
//!
//! Provider calls block for as long as a transfer takes. They run on tokio's
//! blocking threads, and a semaphore caps how many run at once so a burst of
//! requests cannot exhaust the blocking thread pool.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;

/// Why a job did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// The pool was closed before the job could start
    #[error("worker pool closed")]
    Closed,
    /// The job panicked or was cancelled
    #[error("worker job failed: {0}")]
    Failed(String),
}

/// Runs blocking closures with bounded parallelism
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool that runs at most `size` jobs at a time (minimum 1)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Maximum number of concurrent jobs
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of jobs that could start right now without waiting
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking thread once a slot is free
    ///
    /// Waiting for a slot and waiting for the job are both cooperative; the
    /// calling task yields to the scheduler. If the caller is dropped while the
    /// job runs, the job still finishes and its slot is released afterwards.
    pub async fn run<F, T>(&self, job: F) -> Result<T, JobError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| JobError::Closed)?;

        spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| JobError::Failed(e.to_string()))
    }
}
