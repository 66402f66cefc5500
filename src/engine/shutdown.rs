// src/engine/shutdown.rs

//! Shutdown sequencer.
//!
//! Sends SIGTERM to every child, then waits, bounded by a timeout, for all
//! output relays to drain. There is no escalation: children that ignore
//! SIGTERM are left running once the timeout elapses.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::ShutdownStatus;
use crate::exec::{ChildProcess, RelayTracker};

#[derive(Debug)]
pub struct ShutdownSequencer {
    children: Vec<ChildProcess>,
    tracker: RelayTracker,
    timeout: Duration,
}

impl ShutdownSequencer {
    pub fn new(children: Vec<ChildProcess>, tracker: RelayTracker, timeout: Duration) -> Self {
        Self {
            children,
            tracker,
            timeout,
        }
    }

    /// SIGTERM every tracked child, exited or not.
    ///
    /// Returns how many children were signalled without error.
    pub fn signal_all(&self) -> usize {
        let mut signalled = 0;
        for child in &self.children {
            match child.terminate() {
                Ok(()) => {
                    debug!(
                        child = %child.label(),
                        pid = child.pid().as_raw(),
                        exited = child.has_exited(),
                        "sent SIGTERM"
                    );
                    signalled += 1;
                }
                Err(e) => {
                    warn!(child = %child.label(), pid = child.pid().as_raw(), error = %e, "failed to send SIGTERM");
                }
            }
        }
        signalled
    }

    pub async fn run(mut self) -> ShutdownStatus {
        self.signal_all();

        info!(
            pending = self.tracker.pending(),
            timeout = ?self.timeout,
            "waiting for remaining processes to exit"
        );

        let status = if self.tracker.wait_idle_timeout(self.timeout).await {
            ShutdownStatus::Completed
        } else {
            let stuck: Vec<&str> = self
                .children
                .iter()
                .filter(|c| !c.has_exited())
                .map(|c| c.label())
                .collect();
            warn!(?stuck, "some processes did not exit in time");
            ShutdownStatus::TimedOutWaiting
        };

        self.reap();
        status
    }

    fn reap(&mut self) {
        for child in &mut self.children {
            match child.try_reap() {
                Ok(Some(exit)) => debug!(child = %child.label(), %exit, "child reaped"),
                Ok(None) => debug!(child = %child.label(), "child still running"),
                Err(e) => debug!(child = %child.label(), error = %e, "could not reap child"),
            }
        }
    }
}
