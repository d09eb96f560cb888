//! Completion barrier for one level's concurrent metadata lookups.

use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counts outstanding lookups and wakes every waiter once the count reaches
/// zero. The barrier fires at most once.
#[derive(Debug)]
pub(crate) struct LevelBarrier {
    pending: AtomicUsize,
    notify: Notify,
}

impl LevelBarrier {
    pub(crate) fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            pending: AtomicUsize::new(count),
            notify: Notify::new(),
        })
    }

    /// Marks one lookup as finished.
    pub(crate) fn arrive(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                pending.checked_sub(1)
            });
        if previous == Ok(1) {
            self.notify.notify_waiters();
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }

    /// Waits until every lookup has arrived.
    pub(crate) async fn wait(&self) {
        loop {
            let mut notified = pin!(self.notify.notified());
            // Register before checking so a concurrent final arrival is seen.
            notified.as_mut().enable();
            if self.is_complete() {
                return;
            }
            notified.await;
        }
    }

    /// Returns a guard that arrives when dropped, even if the lookup task
    /// panics or is torn down with the runtime.
    pub(crate) fn arrival(self: &Arc<Self>) -> Arrival {
        Arrival(Arc::clone(self))
    }
}

pub(crate) struct Arrival(Arc<LevelBarrier>);

impl Drop for Arrival {
    fn drop(&mut self) {
        self.0.arrive();
    }
}
