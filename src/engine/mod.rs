// src/engine/mod.rs

//! Supervision engine for exitd.
//!
//! This module ties together:
//! - the termination coordinator, which races "first child exited" against
//!   an external termination signal
//! - the shutdown sequencer, which SIGTERMs every child and waits (bounded)
//!   for their output relays to drain
//! - the supervisor, which wires both around a launched group
//!
//! Exactly one [`ShutdownTrigger`] is ever acted upon per run.

use std::fmt;

pub mod coordinator;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use coordinator::{Coordinator, CoordinatorState};
pub use shutdown::ShutdownSequencer;
pub use signals::ShutdownSignals;
pub use supervisor::Supervisor;

/// External termination signals the supervisor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Interrupt,
    Terminate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Interrupt => f.write_str("SIGINT"),
            SignalKind::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// The event that decided the race and started group shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// A child's output relay finished; carries the child's label.
    ChildExited(String),
    /// The supervisor itself was asked to stop.
    SignalReceived(SignalKind),
}

impl ShutdownTrigger {
    pub fn is_signal(&self) -> bool {
        matches!(self, ShutdownTrigger::SignalReceived(_))
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::ChildExited(label) => write!(f, "command \"{label}\" exited"),
            ShutdownTrigger::SignalReceived(kind) => write!(f, "got signal {kind}"),
        }
    }
}

/// How the bounded wait for children ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStatus {
    Completed,
    TimedOutWaiting,
}

/// Final outcome of a supervisor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorResult {
    CleanShutdown,
    PrematureExit,
    TimedOutWaiting,
}

/// What happened during one run: the committed trigger and how the wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub trigger: ShutdownTrigger,
    pub status: ShutdownStatus,
}

impl RunReport {
    pub fn result(&self) -> SupervisorResult {
        match (&self.status, &self.trigger) {
            (ShutdownStatus::TimedOutWaiting, _) => SupervisorResult::TimedOutWaiting,
            (ShutdownStatus::Completed, ShutdownTrigger::SignalReceived(_)) => {
                SupervisorResult::CleanShutdown
            }
            (ShutdownStatus::Completed, ShutdownTrigger::ChildExited(_)) => {
                SupervisorResult::PrematureExit
            }
        }
    }

    /// Exit status is decided by the trigger alone; a timed-out wait only
    /// warrants a warning.
    pub fn is_success(&self) -> bool {
        self.trigger.is_signal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(trigger: ShutdownTrigger, status: ShutdownStatus) -> RunReport {
        RunReport { trigger, status }
    }

    #[test]
    fn classification_follows_trigger() {
        let clean = report(
            ShutdownTrigger::SignalReceived(SignalKind::Interrupt),
            ShutdownStatus::Completed,
        );
        assert_eq!(clean.result(), SupervisorResult::CleanShutdown);
        assert!(clean.is_success());

        let premature = report(
            ShutdownTrigger::ChildExited("web".into()),
            ShutdownStatus::Completed,
        );
        assert_eq!(premature.result(), SupervisorResult::PrematureExit);
        assert!(!premature.is_success());
    }

    #[test]
    fn timeout_does_not_change_exit_status() {
        let by_signal = report(
            ShutdownTrigger::SignalReceived(SignalKind::Terminate),
            ShutdownStatus::TimedOutWaiting,
        );
        assert_eq!(by_signal.result(), SupervisorResult::TimedOutWaiting);
        assert!(by_signal.is_success());

        let by_child = report(
            ShutdownTrigger::ChildExited("db".into()),
            ShutdownStatus::TimedOutWaiting,
        );
        assert!(!by_child.is_success());
    }

    #[test]
    fn trigger_display_matches_log_wording() {
        assert_eq!(
            ShutdownTrigger::ChildExited("web".into()).to_string(),
            "command \"web\" exited"
        );
        assert_eq!(
            ShutdownTrigger::SignalReceived(SignalKind::Interrupt).to_string(),
            "got signal SIGINT"
        );
    }
}
