//! Fan-out limiting for sibling crawls
//!
//! Each sitemap index gets its own [`FanOutLimiter`], bounding how many of its
//! direct children are in flight at once. Limiters are not shared across
//! levels, so the total number of requests across a deep tree can exceed the
//! per-index bound.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Admission control for the children of one sitemap index
///
/// Children wait for a permit in the order they were dispatched; tokio's
/// semaphore is fair, so the first queued child is the first admitted.
#[derive(Debug)]
pub struct FanOutLimiter {
    permits: Semaphore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FanOutLimiter {
    /// Creates a limiter admitting at most `max_concurrency` futures at once
    ///
    /// A bound of zero is raised to one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            permits: Semaphore::new(max_concurrency.max(1)),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Runs `task` once a slot is free
    ///
    /// The task is not polled before admission, so no work (and no request)
    /// starts while it is queued.
    pub async fn run<F>(&self, task: F) -> F::Output
    where
        F: Future,
    {
        // The semaphore is never closed
        let _permit = self.permits.acquire().await.ok();

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        let _slot = SlotRelease(&self.in_flight);

        task.await
    }

    /// Number of tasks currently admitted
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of tasks admitted at the same time so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight count when an admitted task ends or is dropped
struct SlotRelease<'a>(&'a AtomicUsize);

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
