use std::path::PathBuf;

/// Configuration overrides taken from the command line.
///
/// Values set here win over every other source.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file (`--config`)
    pub config_path: Option<PathBuf>,
    /// Provider override (`--provider`)
    pub provider: Option<String>,
    /// Use the offline simulated provider (`--dry-run`)
    pub dry_run: bool,
}
