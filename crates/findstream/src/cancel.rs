//! Cancellation tokens for scans.
//!
//! Dropping a scan is always enough to stop it. A token is for the other
//! case: stopping a scan that is owned by a different task, such as the
//! producer behind [`Scan::into_channel`](crate::Scan::into_channel).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token for terminating a scan early.
///
/// Clones share the same flag, so any clone can cancel every scan holding
/// another clone.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Scans notice it before their next step.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Checks if this token is still active.
    ///
    /// Returns `Some(())` if still active, `None` if cancelled.
    /// This enables use with the `?` operator for early returns.
    #[inline]
    pub fn is_active(&self) -> Option<()> {
        if self.cancelled.load(Ordering::Acquire) {
            None
        } else {
            Some(())
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_active().is_none()
    }
}
