// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::PrefixPolicy;

/// Command-line arguments for `exitd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "exitd",
    version,
    about = "Run a group of programs together; when one exits, stop them all.",
    long_about = None
)]
pub struct CliArgs {
    /// Programs to supervise (at least two). Each is launched verbatim
    /// without arguments.
    #[arg(value_name = "COMMAND", required = true)]
    pub commands: Vec<String>,

    /// Which children get a timestamp/label prefix on their output.
    ///
    /// If omitted, `EXITD_PREFIX` or `all` is used.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub prefix: Option<PrefixPolicy>,

    /// How long to wait for children to exit after SIGTERM (e.g. `5s`, `500ms`).
    #[arg(long, value_name = "DURATION", default_value = "5s")]
    pub shutdown_timeout: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXITD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_flags() {
        let args = CliArgs::try_parse_from([
            "exitd",
            "--prefix",
            "first",
            "--shutdown-timeout",
            "250ms",
            "/usr/bin/web",
            "worker",
        ])
        .expect("valid args");

        assert_eq!(args.commands, vec!["/usr/bin/web", "worker"]);
        assert_eq!(args.prefix, Some(PrefixPolicy::First));
        assert_eq!(args.shutdown_timeout, "250ms");
        assert!(args.log_level.is_none());
    }

    #[test]
    fn requires_at_least_one_command() {
        assert!(CliArgs::try_parse_from(["exitd"]).is_err());
    }
}
