//! Cooperative cancellation for long-running validation.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cheaply cloneable flag that lets a caller stop an in-progress [`crate::Validator::validate_with_cancellation`]
/// call from another thread.
///
/// Cancellation is cooperative: the evaluator checks the token once per top-level keyword
/// dispatch, not inside hot per-character paths such as `pattern` or `format`. A cancelled
/// run leaves no partial output; it returns a single [`crate::error::ValidationErrorKind::Cancelled`]
/// error.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> CancellationToken {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn fresh_token_is_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_observed_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
