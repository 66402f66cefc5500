// src/engine/coordinator.rs

//! Termination coordinator.
//!
//! Owns every launched [`ChildProcess`] and the shared [`RelayTracker`], and
//! blocks on a two-armed race: the first relay reporting its child exited,
//! or an external termination signal. Whichever arrives first is committed
//! as the run's [`ShutdownTrigger`]; anything arriving later is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::engine::{ShutdownSequencer, ShutdownTrigger, SignalKind};
use crate::errors::Result;
use crate::exec::{ChildProcess, Launcher, LineSink, RelayTracker};
use crate::types::PrefixPolicy;

/// `Running` until a trigger is committed, then `ShuttingDown` for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorState {
    Running,
    ShuttingDown(ShutdownTrigger),
}

impl CoordinatorState {
    /// Commit `trigger` if nothing has been committed yet.
    ///
    /// Returns `true` if this trigger won.
    pub fn commit(&mut self, trigger: ShutdownTrigger) -> bool {
        match self {
            CoordinatorState::Running => {
                *self = CoordinatorState::ShuttingDown(trigger);
                true
            }
            CoordinatorState::ShuttingDown(_) => false,
        }
    }

    pub fn trigger(&self) -> Option<&ShutdownTrigger> {
        match self {
            CoordinatorState::Running => None,
            CoordinatorState::ShuttingDown(trigger) => Some(trigger),
        }
    }
}

#[derive(Debug)]
pub struct Coordinator {
    children: Vec<ChildProcess>,
    tracker: RelayTracker,
    exit_rx: mpsc::Receiver<String>,
    state: CoordinatorState,
}

impl Coordinator {
    /// Launch every command as one group.
    ///
    /// If any launch fails, the children already started are sent SIGTERM
    /// and the launch error is returned; there is no partial-group mode.
    pub fn launch(
        commands: &[String],
        prefix: PrefixPolicy,
        sink: Arc<dyn LineSink>,
    ) -> Result<Self> {
        let tracker = RelayTracker::new();
        // One slot per child: a relay's exit report can never block.
        let (exit_tx, exit_rx) = mpsc::channel(commands.len().max(1));
        let launcher = Launcher::new(prefix, sink, tracker.clone(), exit_tx);

        let mut children = Vec::with_capacity(commands.len());
        for (index, command) in commands.iter().enumerate() {
            match launcher.launch(index, command) {
                Ok(child) => children.push(child),
                Err(err) => {
                    for child in &children {
                        if let Err(e) = child.terminate() {
                            warn!(child = %child.label(), error = %e, "failed to stop child after launch error");
                        }
                    }
                    return Err(err);
                }
            }
        }

        Ok(Self {
            children,
            tracker,
            exit_rx,
            state: CoordinatorState::Running,
        })
    }

    pub fn children(&self) -> &[ChildProcess] {
        &self.children
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn pending_relays(&self) -> usize {
        self.tracker.pending()
    }

    /// Block until the first child exits or `shutdown_signal` resolves.
    ///
    /// Once a trigger has been committed, later calls return it unchanged.
    pub async fn wait_for_trigger<S>(&mut self, shutdown_signal: S) -> ShutdownTrigger
    where
        S: Future<Output = SignalKind>,
    {
        if let Some(trigger) = self.state.trigger() {
            return trigger.clone();
        }

        let trigger = tokio::select! {
            Some(label) = self.exit_rx.recv() => ShutdownTrigger::ChildExited(label),
            kind = shutdown_signal => ShutdownTrigger::SignalReceived(kind),
        };

        self.state.commit(trigger.clone());
        // Late exit reports now fail fast in `try_send` instead of queueing.
        self.exit_rx.close();

        info!(%trigger, "shutting down process group");
        trigger
    }

    /// Hand the group over to the shutdown sequencer.
    pub fn into_sequencer(self, timeout: Duration) -> ShutdownSequencer {
        ShutdownSequencer::new(self.children, self.tracker, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_trigger_is_committed() {
        let mut state = CoordinatorState::Running;
        assert!(state.trigger().is_none());

        assert!(state.commit(ShutdownTrigger::ChildExited("a".into())));
        assert!(!state.commit(ShutdownTrigger::SignalReceived(SignalKind::Interrupt)));
        assert!(!state.commit(ShutdownTrigger::ChildExited("b".into())));

        assert_eq!(
            state.trigger(),
            Some(&ShutdownTrigger::ChildExited("a".into()))
        );
    }
}
