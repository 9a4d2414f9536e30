//! One-shot readiness signal.

use tokio::sync::watch;

/// A flag that flips from "not ready" to "ready" exactly once.
///
/// Any number of tasks may [`wait`](Self::wait) on it, before or after it
/// resolves. Waiting on a resolved signal returns without suspending;
/// waiting on an unresolved one suspends only the waiting task.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl ReadySignal {
    /// Create an unresolved signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Resolve the signal, waking every waiter.
    ///
    /// Returns true on the first call only; later calls are no-ops.
    pub fn resolve(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    /// Returns true once the signal has been resolved.
    pub fn is_resolved(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal is resolved.
    ///
    /// There is no timeout: if the signal never resolves, neither does this.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}
