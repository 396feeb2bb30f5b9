//! Cooperative cancellation.
//!
//! The source engine runs on an async scheduler and suspends at store
//! boundaries; a caller cancels by dropping or aborting the task. This
//! crate has no async runtime, so cancellation is represented as a
//! synchronously-polled flag instead: callers hold a [`CancellationToken`],
//! share a clone with the engine call, and flip it from another thread (or
//! a signal handler) to request an early exit. The engine checks it at
//! every point the design notes call out: guard acquisition, each
//! candidate-expansion iteration of `ef_search`, each neighbor-selection
//! iteration, and before each context-mediated store read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable flag an engine call polls to decide whether to keep
/// running.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not yet cancelled.
    pub fn new() -> Self {
        CancellationToken {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A token that never cancels. Used as the default for calls that
    /// don't need cooperative cancellation.
    pub fn never() -> Self {
        Self::new()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once `cancel` has been called on this token or any clone of it.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
