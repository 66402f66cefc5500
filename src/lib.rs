// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::SupervisorConfig;
use crate::engine::{RunReport, ShutdownSignals, Supervisor};
use crate::errors::Result;
use crate::exec::WriterSink;

/// How long to wait for queued child output to reach stdout before exiting.
const OUTPUT_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config from CLI flags and environment
/// - SIGINT/SIGTERM listeners (installed before anything is launched)
/// - the supervisor, relaying child output to stdout
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let config = SupervisorConfig::from_args(&args)?;
    let mut signals = ShutdownSignals::register()?;

    let sink = WriterSink::stdout();
    let supervisor = Supervisor::new(config, Arc::new(sink.clone()));
    let outcome = supervisor.run(signals.recv()).await;

    if tokio::time::timeout(OUTPUT_FLUSH_TIMEOUT, sink.flush())
        .await
        .is_err()
    {
        debug!("stdout not drained before exit; remaining output dropped");
    }
    let report = outcome?;

    if report.is_success() {
        info!("Done");
    } else {
        info!("Done. One or more processes exited prematurely.");
    }

    Ok(report)
}
