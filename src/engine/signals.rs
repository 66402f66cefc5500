// src/engine/signals.rs

//! OS termination signals directed at the supervisor itself.
//!
//! Handlers are installed by [`ShutdownSignals::register`] and stay installed
//! for the life of the process, so repeated signals after the first are
//! absorbed instead of killing the supervisor mid-shutdown.

use tokio::signal::unix::{Signal, SignalKind as UnixSignalKind, signal};

use crate::engine::SignalKind;
use crate::errors::{ExitdError, Result};

#[derive(Debug)]
pub struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
}

impl ShutdownSignals {
    /// Install SIGINT and SIGTERM listeners.
    pub fn register() -> Result<Self> {
        let sigint = signal(UnixSignalKind::interrupt()).map_err(ExitdError::Signal)?;
        let sigterm = signal(UnixSignalKind::terminate()).map_err(ExitdError::Signal)?;
        Ok(Self { sigint, sigterm })
    }

    /// Wait for the next SIGINT or SIGTERM.
    pub async fn recv(&mut self) -> SignalKind {
        tokio::select! {
            _ = self.sigint.recv() => SignalKind::Interrupt,
            _ = self.sigterm.recv() => SignalKind::Terminate,
        }
    }
}
