// src/exec/relay.rs

//! Output relay: drains one child's stdout and stderr into a [`LineSink`].
//!
//! The relay finishes when both streams reach end-of-stream (or fail to
//! read, which is treated the same way). On completion it marks the child as
//! exited, releases its [`RelayLease`] and reports the child's label to the
//! coordinator without blocking.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::exec::sink::{LineFormatter, LineSink};
use crate::exec::tracker::RelayLease;

/// Everything a relay needs besides the streams themselves.
#[derive(Debug)]
pub struct RelayHandles {
    pub formatter: LineFormatter,
    pub sink: Arc<dyn LineSink>,
    pub lease: RelayLease,
    pub exited: Arc<AtomicBool>,
    pub exit_tx: mpsc::Sender<String>,
}

/// Background task bound 1:1 to a child process.
pub struct OutputRelay<O, E> {
    stdout: O,
    stderr: E,
    handles: RelayHandles,
}

impl<O, E> OutputRelay<O, E>
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(stdout: O, stderr: E, handles: RelayHandles) -> Self {
        Self {
            stdout,
            stderr,
            handles,
        }
    }

    /// Run detached. Completion is observed through the lease, the exited
    /// flag and the exit channel rather than a join handle.
    pub fn spawn(self) {
        tokio::spawn(self.run());
    }

    pub async fn run(self) {
        let OutputRelay {
            stdout,
            stderr,
            handles,
        } = self;
        let label = handles.formatter.label().to_string();

        let mut out = BufReader::new(stdout);
        let mut err = BufReader::new(stderr);
        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();
        let mut out_open = true;
        let mut err_open = true;

        // `read_until` is cancel safe: partial reads stay in the buffer and
        // the next call continues from there.
        while out_open || err_open {
            tokio::select! {
                res = out.read_until(b'\n', &mut out_buf), if out_open => {
                    out_open = forward(&handles, &label, "stdout", res, &mut out_buf).await;
                }
                res = err.read_until(b'\n', &mut err_buf), if err_open => {
                    err_open = forward(&handles, &label, "stderr", res, &mut err_buf).await;
                }
            }
        }

        debug!(child = %label, "child output closed");

        let RelayHandles {
            lease,
            exited,
            exit_tx,
            ..
        } = handles;

        let already = exited.swap(true, Ordering::AcqRel);
        debug_assert!(!already, "relay completed twice for {label}");
        drop(lease);

        // The coordinator may have stopped listening; never wait on it.
        if let Err(e) = exit_tx.try_send(label) {
            trace!(error = %e, "exit notification dropped");
        }
    }
}

/// Emit one read result. Returns whether the stream is still open.
async fn forward(
    handles: &RelayHandles,
    label: &str,
    stream: &'static str,
    res: io::Result<usize>,
    buf: &mut Vec<u8>,
) -> bool {
    match res {
        Ok(0) => false,
        Ok(_) => {
            let line = handles
                .formatter
                .format(&String::from_utf8_lossy(trim_line_ending(buf)));
            buf.clear();
            handles.sink.write_line(line).await;
            true
        }
        Err(e) => {
            debug!(child = %label, stream, error = %e, "read error; treating as end of stream");
            buf.clear();
            false
        }
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}
