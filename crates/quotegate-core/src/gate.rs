//! Bounded-concurrency gate for upstream downloads.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Default number of simultaneous provider downloads.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Counting semaphore every fetch attempt passes through.
///
/// The permit is held for the whole provider call and released when it is
/// dropped, so success, error and unwinding all give the slot back.
#[derive(Debug, Clone)]
pub struct DownloadGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Default for DownloadGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_DOWNLOADS)
    }
}

impl DownloadGate {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a slot, then runs `work` while holding it.
    pub async fn run<F, T>(&self, work: F) -> Result<T, GateClosed>
    where
        F: Future<Output = T>,
    {
        let _permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;
        Ok(work.await)
    }
}

/// The semaphore was closed. The gate never closes it itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("download gate is closed")]
pub struct GateClosed;
