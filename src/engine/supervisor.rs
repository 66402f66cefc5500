// src/engine/supervisor.rs

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::config::SupervisorConfig;
use crate::engine::{Coordinator, RunReport, SignalKind};
use crate::errors::Result;
use crate::exec::LineSink;

/// Runs one process group from launch to confirmed (or abandoned) shutdown.
#[derive(Debug)]
pub struct Supervisor {
    config: SupervisorConfig,
    sink: Arc<dyn LineSink>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, sink: Arc<dyn LineSink>) -> Self {
        Self { config, sink }
    }

    /// Launch the group, wait for the first trigger, then shut everything down.
    ///
    /// `shutdown_signal` resolves when the supervisor itself should stop; in
    /// production this is [`ShutdownSignals::recv`](crate::engine::ShutdownSignals::recv).
    pub async fn run<S>(&self, shutdown_signal: S) -> Result<RunReport>
    where
        S: Future<Output = SignalKind>,
    {
        let mut coordinator =
            Coordinator::launch(&self.config.commands, self.config.prefix, Arc::clone(&self.sink))?;
        info!(children = coordinator.children().len(), "process group started");

        let trigger = coordinator.wait_for_trigger(shutdown_signal).await;
        let status = coordinator
            .into_sequencer(self.config.shutdown_timeout)
            .run()
            .await;

        Ok(RunReport { trigger, status })
    }
}
