// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the supervised programs
//! with `tokio::process::Command` and draining their output.
//!
//! - [`launcher`] starts one child and hands back a signalable handle.
//! - [`relay`] drains a child's stdout/stderr line by line into a sink.
//! - [`sink`] defines where relayed lines go and how they are prefixed;
//!   stdout is written by one dedicated task fed over a channel.
//! - [`tracker`] counts relays still draining, so shutdown can wait on them.

pub mod launcher;
pub mod relay;
pub mod sink;
pub mod tracker;

pub use launcher::{ChildProcess, Launcher, derive_label};
pub use relay::{OutputRelay, RelayHandles};
pub use sink::{LineFormatter, LineSink, WriterSink};
pub use tracker::{RelayLease, RelayTracker};
