//! Run-wide cancellation
//!
//! A crawl shares one cancellation context across every recursion frame.
//! [`CancellationSource`] is held by the single actor allowed to trigger it;
//! every frame receives a read-only [`CancellationSignal`] by value.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// The owning side of a cancellation context
///
/// Only the source can trigger cancellation. Triggering is write-once: a
/// cancelled source stays cancelled, and a fresh source is needed for a new
/// run.
#[derive(Debug, Default)]
pub struct CancellationSource {
    token: CancellationToken,
}

impl CancellationSource {
    /// Creates a new, untriggered cancellation source
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Returns a read-only signal observing this source
    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            token: self.token.clone(),
        }
    }

    /// Triggers cancellation for every signal derived from this source
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("Cancellation requested");
        }
        self.token.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A read-only view of a cancellation context
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
}

impl CancellationSignal {
    /// Returns a signal that is never triggered
    ///
    /// Used when neither the crawler nor the call supplies a signal.
    pub fn never() -> Self {
        Self::default()
    }

    /// Returns true if the owning source has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the owning source is cancelled
    ///
    /// Resolves immediately if cancellation already happened.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Derives a token that is cancelled together with this signal but can
    /// also be cancelled on its own without affecting the run
    pub(crate) fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}
