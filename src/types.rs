use std::str::FromStr;

use clap::ValueEnum;

/// Which children get the `<timestamp> <label>: ` prefix on their output.
///
/// - `All`: every line of every child is prefixed (default behaviour).
/// - `First`: the first-listed command is written bare, all others are
///   prefixed. Useful when one child is the "primary" process.
/// - `Off`: no child output is prefixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PrefixPolicy {
    #[default]
    All,
    First,
    Off,
}

impl PrefixPolicy {
    /// Whether the child launched at position `index` gets a prefix.
    pub fn prefixes(self, index: usize) -> bool {
        match self {
            PrefixPolicy::All => true,
            PrefixPolicy::First => index != 0,
            PrefixPolicy::Off => false,
        }
    }
}

impl FromStr for PrefixPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "on" => Ok(PrefixPolicy::All),
            "first" => Ok(PrefixPolicy::First),
            "off" | "none" => Ok(PrefixPolicy::Off),
            other => Err(format!(
                "invalid prefix policy: {other} (expected \"all\", \"first\" or \"off\")"
            )),
        }
    }
}
