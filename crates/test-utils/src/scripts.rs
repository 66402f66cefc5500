use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

/// A temp directory of executable `/bin/sh` scripts.
///
/// Supervised commands take no arguments, so tests describe each child's
/// behaviour as a small script and pass its path as the command.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `body` as an executable script called `name`; returns its path.
    pub fn script(&self, name: &str, body: &str) -> Result<String> {
        let path: PathBuf = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path.to_string_lossy().into_owned())
    }

    /// Exits immediately with status 0.
    pub fn quick(&self, name: &str) -> Result<String> {
        self.script(name, "exit 0")
    }

    /// Prints `ready`, then runs until signalled; prints `got TERM` when
    /// SIGTERM arrives.
    pub fn long_running(&self, name: &str) -> Result<String> {
        self.script(
            name,
            "trap 'echo got TERM; exit 0' TERM\necho ready\nwhile true; do sleep 0.05; done",
        )
    }

    /// Prints `ready`, then ignores SIGTERM and keeps its output open for
    /// `secs` seconds.
    pub fn stubborn(&self, name: &str, secs: u32) -> Result<String> {
        self.script(name, &format!("trap '' TERM\necho ready\nexec sleep {secs}"))
    }
}
