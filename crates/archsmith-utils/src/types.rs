//! Small types shared across archsmith crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of a configuration value.
///
/// Precedence, highest first: CLI arguments, environment, config file, programmatic
/// overrides, built-in defaults.
///
/// Serializes to lowercase strings: `"cli"`, `"env"`, `"config"`, `"programmatic"`,
/// `"default"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument.
    Cli,
    /// Value taken from an `ARCHSMITH_*` environment variable.
    Env,
    /// Value loaded from a configuration file.
    Config,
    /// Value provided through `ConfigBuilder`.
    Programmatic,
    /// Built-in default value.
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        };
        f.write_str(label)
    }
}
