// src/config.rs

//! Supervisor configuration assembled from CLI flags and environment.
//!
//! Priority for each option: CLI flag, then `EXITD_*` environment variable,
//! then the built-in default.

use std::time::Duration;

use tracing::warn;

use crate::cli::CliArgs;
use crate::errors::{ExitdError, Result};
use crate::types::PrefixPolicy;

/// Grace period granted to children between SIGTERM and giving up on them.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable selecting the [`PrefixPolicy`].
pub const PREFIX_ENV: &str = "EXITD_PREFIX";

/// Minimum number of commands a group must contain.
pub const MIN_COMMANDS: usize = 2;

/// Everything the supervision core needs to run one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub commands: Vec<String>,
    pub prefix: PrefixPolicy,
    pub shutdown_timeout: Duration,
}

impl SupervisorConfig {
    pub fn new(commands: Vec<String>) -> Result<Self> {
        if commands.len() < MIN_COMMANDS {
            return Err(ExitdError::Usage(format!(
                "need at least {MIN_COMMANDS} programs to run, got {}",
                commands.len()
            )));
        }

        Ok(Self {
            commands,
            prefix: PrefixPolicy::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }

    pub fn with_prefix(mut self, prefix: PrefixPolicy) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Build the config from parsed CLI args and the process environment.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    /// Same as [`from_args`](Self::from_args) but with an injectable
    /// environment lookup.
    pub fn from_args_with_env<F>(args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = match args.prefix {
            Some(p) => p,
            None => env(PREFIX_ENV)
                .map(|raw| {
                    raw.parse().unwrap_or_else(|e: String| {
                        warn!(error = %e, "ignoring {PREFIX_ENV}; prefixing all output");
                        PrefixPolicy::default()
                    })
                })
                .unwrap_or_default(),
        };

        let shutdown_timeout = parse_duration(&args.shutdown_timeout)
            .map_err(|e| ExitdError::Usage(format!("--shutdown-timeout: {e}")))?;

        Ok(Self::new(args.commands.clone())?
            .with_prefix(prefix)
            .with_shutdown_timeout(shutdown_timeout))
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
