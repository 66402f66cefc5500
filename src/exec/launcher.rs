// src/exec/launcher.rs

//! Child launcher: starts one external program and attaches an
//! [`OutputRelay`] to its output streams.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{ExitdError, Result};
use crate::exec::relay::{OutputRelay, RelayHandles};
use crate::exec::sink::{LineFormatter, LineSink};
use crate::exec::tracker::RelayTracker;
use crate::types::PrefixPolicy;

/// Identity label for a command: its final `/`-separated path segment.
///
/// `/usr/bin/foo` and `foo` both label as `foo`. Labels are not made unique.
pub fn derive_label(command: &str) -> &str {
    command.rsplit('/').next().unwrap_or(command)
}

/// One spawned external program.
#[derive(Debug)]
pub struct ChildProcess {
    label: String,
    pid: Pid,
    child: Child,
    exited: Arc<AtomicBool>,
}

impl ChildProcess {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Set once the child's relay has drained both output streams.
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Ask the child to stop with SIGTERM.
    ///
    /// An already-exited child is not an error: until it is reaped the PID
    /// still names the zombie, and after reaping `kill` reports `ESRCH`.
    pub fn terminate(&self) -> nix::Result<()> {
        match signal::kill(self.pid, Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Reap the child if it has exited, without blocking.
    pub fn try_reap(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }
}

/// Launches children and wires each into the shared relay bookkeeping.
#[derive(Debug, Clone)]
pub struct Launcher {
    prefix: PrefixPolicy,
    sink: Arc<dyn LineSink>,
    tracker: RelayTracker,
    exit_tx: mpsc::Sender<String>,
}

impl Launcher {
    pub fn new(
        prefix: PrefixPolicy,
        sink: Arc<dyn LineSink>,
        tracker: RelayTracker,
        exit_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            prefix,
            sink,
            tracker,
            exit_tx,
        }
    }

    /// Start `command` (no arguments) as the `index`-th member of the group.
    pub fn launch(&self, index: usize, command: &str) -> Result<ChildProcess> {
        let label = derive_label(command).to_string();

        let mut child = spawn_piped(command)?;

        let pid = child
            .id()
            .and_then(|id| i32::try_from(id).ok())
            .map(Pid::from_raw)
            .ok_or_else(|| {
                ExitdError::launch(command, io::Error::other("spawned child has no PID"))
            })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => (out, err),
            _ => {
                let _ = signal::kill(pid, Signal::SIGTERM);
                return Err(ExitdError::launch(
                    command,
                    io::Error::new(io::ErrorKind::BrokenPipe, "child output pipes unavailable"),
                ));
            }
        };

        let exited = Arc::new(AtomicBool::new(false));
        let handles = RelayHandles {
            formatter: LineFormatter::new(label.clone(), self.prefix.prefixes(index)),
            sink: Arc::clone(&self.sink),
            lease: self.tracker.acquire(),
            exited: Arc::clone(&exited),
            exit_tx: self.exit_tx.clone(),
        };
        OutputRelay::new(stdout, stderr, handles).spawn();

        info!(child = %label, pid = pid.as_raw(), command, "launched child");

        Ok(ChildProcess {
            label,
            pid,
            child,
            exited,
        })
    }
}

/// Spawn with piped stdout/stderr. The `Command` (and the parent's copies
/// of the pipe write ends it holds) is dropped on return so relays see EOF.
fn spawn_piped(command: &str) -> Result<Child> {
    let mut cmd = Command::new(command);
    // No forced kill on drop: shutdown only ever sends SIGTERM.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false);

    debug!(command, "spawning child");
    cmd.spawn().map_err(|e| ExitdError::launch(command, e))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::exec::sink::WriterSink;

    #[test]
    fn label_is_final_path_segment() {
        assert_eq!(derive_label("/usr/bin/foo"), "foo");
        assert_eq!(derive_label("foo"), "foo");
        assert_eq!(derive_label("./bin/worker"), "worker");
        assert_eq!(derive_label("dir/"), "");
    }

    proptest! {
        #[test]
        fn label_never_contains_a_slash(cmd in "[a-z/._-]{0,40}") {
            prop_assert!(!derive_label(&cmd).contains('/'));
        }

        #[test]
        fn label_ignores_leading_directories(dir in "[a-z]{1,8}(/[a-z]{1,8}){0,3}", name in "[a-z][a-z0-9_-]{0,12}") {
            let cmd = format!("/{dir}/{name}");
            prop_assert_eq!(derive_label(&cmd), name.as_str());
        }
    }

    fn launcher() -> (Launcher, RelayTracker, mpsc::Receiver<String>) {
        let tracker = RelayTracker::new();
        let (tx, rx) = mpsc::channel(4);
        let launcher = Launcher::new(
            PrefixPolicy::All,
            Arc::new(WriterSink::with_writer(tokio::io::sink())),
            tracker.clone(),
            tx,
        );
        (launcher, tracker, rx)
    }

    #[tokio::test]
    async fn missing_executable_is_a_launch_error() {
        let (launcher, tracker, _rx) = launcher();
        let err = launcher
            .launch(0, "/definitely/not/a/real/program")
            .unwrap_err();

        assert!(matches!(err, ExitdError::Launch { ref command, .. } if command == "/definitely/not/a/real/program"));
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn terminating_an_exited_child_is_harmless() {
        let (launcher, tracker, mut rx) = launcher();
        let mut child = launcher.launch(0, "true").expect("`true` should be on PATH");
        assert_eq!(child.label(), "true");

        let label = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("relay should finish")
            .expect("channel open");
        assert_eq!(label, "true");
        assert!(child.has_exited());
        assert!(tracker.wait_idle_timeout(Duration::from_secs(1)).await);

        // Exited but not yet reaped: the PID still names the zombie.
        assert!(child.terminate().is_ok());

        let status = tokio::time::timeout(Duration::from_secs(5), child.child.wait())
            .await
            .expect("reap in time")
            .expect("wait succeeds");
        assert!(status.success());
        assert!(child.try_reap().expect("try_wait after reap").is_some());
    }
}
