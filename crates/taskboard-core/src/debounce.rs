// ── Trailing-edge debouncer ──
//
// Collapses a burst of calls into one: each call restarts the quiet
// window, and only the most recent call's work runs once the window
// elapses without another call.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::trace;

/// Quiet window for search-as-you-type inputs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Runs only the last of a burst of calls, after `window` of quiet.
///
/// Dropping the debouncer cancels the pending call.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<AbortHandle>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `work`, replacing any call still waiting out the window.
    ///
    /// The returned handle resolves once the work has run. If a later call
    /// supersedes this one, awaiting it yields a cancelled `JoinError`.
    pub fn call<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            work.await;
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task.abort_handle());
        if let Some(previous) = previous {
            trace!("debounced call superseded");
            previous.abort();
        }
        task
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }
    }
}
