//! Liveness tokens for the load pipeline
//!
//! A mounted viewer holds a token; unmounting cancels it. The loader checks
//! the token every time it resumes from an await and stops publishing state
//! once it is cancelled.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token for cooperative cancellation
///
/// Clones share the same state, so the host can keep one clone and hand
/// another to the loader.
///
/// # Example
///
/// ```
/// use flipbook_viewer::CancellationToken;
///
/// let token = CancellationToken::new();
/// let loader_token = token.clone();
///
/// // On unmount:
/// token.cancel();
/// assert!(loader_token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, live token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns a guard that cancels the token when dropped
    ///
    /// Tie the guard to the lifetime of whatever owns the viewer and the
    /// pipeline stops with it.
    pub fn drop_guard(&self) -> DropGuard {
        DropGuard { token: Some(self.clone()) }
    }
}

/// Cancels its token on drop unless [`DropGuard::disarm`] was called
#[derive(Debug)]
pub struct DropGuard {
    token: Option<CancellationToken>,
}

impl DropGuard {
    /// Give the token back without cancelling it
    pub fn disarm(mut self) -> CancellationToken {
        self.token.take().unwrap_or_default()
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}
