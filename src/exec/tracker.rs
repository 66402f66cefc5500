// src/exec/tracker.rs

//! Pending-relay counter shared between the coordinator and every relay.
//!
//! Each relay holds a [`RelayLease`]; dropping the lease (normal return,
//! early return or panic unwinding) decrements the count exactly once and
//! wakes anyone blocked in [`RelayTracker::wait_idle`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    idle: Notify,
}

/// Counts relays that have not yet finished draining their child's output.
#[derive(Debug, Clone, Default)]
pub struct RelayTracker {
    inner: Arc<Inner>,
}

impl RelayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one unit of pending relay work.
    pub fn acquire(&self) -> RelayLease {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        RelayLease {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Resolve once every outstanding lease has been released.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register interest before checking so a release in between
            // cannot be missed.
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) but bounded.
    ///
    /// Returns `true` if all leases were released in time, `false` on timeout.
    pub async fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }
}

/// One unit of pending relay work; released on drop.
#[derive(Debug)]
pub struct RelayLease {
    inner: Arc<Inner>,
}

impl Drop for RelayLease {
    fn drop(&mut self) {
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
