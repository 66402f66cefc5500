//! Shared fixtures for `exitd` integration tests: throwaway child scripts,
//! an in-memory output sink and log capture.

pub mod scripts;
pub mod sink;

pub use scripts::ScriptDir;
pub use sink::MemorySink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for any single supervisor scenario.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);

static LOGS: Once = Once::new();

/// Route supervisor events into the harness's captured output.
///
/// Reads the same `EXITD_LOG` variable as the binary (as an `EnvFilter`
/// directive); without it, only `exitd` debug events and warnings from
/// dependencies are kept. Captured lines show up for failing tests only.
pub fn init_tracing() {
    LOGS.call_once(|| {
        let filter = EnvFilter::try_from_env("EXITD_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,exitd=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .try_init();
    });
}

/// Fail the test if `f` outlives [`SCENARIO_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(SCENARIO_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("scenario still running after {SCENARIO_TIMEOUT:?}"),
    }
}
