//! Per-request deadlines
//!
//! Every sitemap fetch is armed with a [`DeadlineGuard`]. The guard owns a
//! timer task that cancels the fetch when the deadline passes, and a token
//! derived from the run's cancellation signal, so cancelling the run fires
//! every armed guard at once.
//!
//! Guards are registered under a [`RequestId`] unique to each dispatch, so
//! two in-flight fetches never share a timer, even for the same URL.

use crate::cancel::CancellationSignal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Identifier of one armed deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Registry of armed deadline timers
#[derive(Debug, Default)]
struct Registry {
    next_id: AtomicU64,
    timers: Mutex<HashMap<RequestId, JoinHandle<()>>>,
}

impl Registry {
    fn timers(&self) -> MutexGuard<'_, HashMap<RequestId, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops the timer for `id`, stopping it if it is still pending
    fn clear(&self, id: RequestId) {
        if let Some(timer) = self.timers().remove(&id) {
            timer.abort();
        }
    }
}

/// Factory and registry for [`DeadlineGuard`]s
#[derive(Debug, Clone)]
pub struct Deadlines {
    timeout: Duration,
    registry: Arc<Registry>,
}

impl Deadlines {
    /// Creates a registry arming guards with the given timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            registry: Arc::new(Registry::default()),
        }
    }

    /// The timeout applied to every guard
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arms a deadline for one fetch of `url`
    ///
    /// If `signal` is already cancelled the guard is fired on arrival and no
    /// timer is started. Otherwise a timer task is spawned that fires the
    /// guard after the timeout; cancelling `signal` fires it early.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&self, url: &str, signal: &CancellationSignal) -> DeadlineGuard {
        let id = RequestId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let token = signal.child_token();
        let timed_out = Arc::new(AtomicBool::new(false));

        let guard = DeadlineGuard {
            id,
            token: token.clone(),
            timed_out: timed_out.clone(),
            timeout: self.timeout,
            registry: self.registry.clone(),
        };

        if token.is_cancelled() {
            tracing::trace!("Not arming deadline for {}: run already cancelled", url);
            return guard;
        }

        // Held across spawn so the timer cannot deregister before it is registered
        let mut timers = self.registry.timers();
        let registry = self.registry.clone();
        let timeout = self.timeout;
        let url = url.to_string();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    tracing::debug!("Deadline of {:?} reached for {}", timeout, url);
                    timed_out.store(true, Ordering::SeqCst);
                    token.cancel();
                }
                _ = token.cancelled() => {
                    tracing::trace!("Deadline for {} fired by cancellation", url);
                }
            }
            registry.timers().remove(&id);
        });
        timers.insert(id, timer);

        guard
    }

    /// Number of guards whose timer is still registered
    pub fn active(&self) -> usize {
        self.registry.timers().len()
    }
}

/// A deadline armed for one in-flight fetch
///
/// The guard is cleared explicitly with [`clear`](Self::clear) once the fetch
/// settles; dropping it clears it as well.
#[derive(Debug)]
pub struct DeadlineGuard {
    id: RequestId,
    token: CancellationToken,
    timed_out: Arc<AtomicBool>,
    timeout: Duration,
    registry: Arc<Registry>,
}

impl DeadlineGuard {
    /// Identifier of this dispatch
    #[cfg(test)]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Resolves once the guard fires, by timeout or by run cancellation
    pub fn fired(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Returns true if the guard fired
    #[cfg(test)]
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true if the guard fired because the deadline passed
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// The timeout this guard was armed with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stops the timer so it cannot fire after the fetch settled
    pub fn clear(self) {
        drop(self);
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.registry.clear(self.id);
    }
}
