//! Command-line interface for archsmith
//!
//! - `args`: clap definitions
//! - `run`: entry point, config discovery and dispatch
//! - `commands`: command implementations and shared helpers

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands};
pub use commands::{ManualEntry, parse_manual_entry, parse_requirements_file};
pub use run::run;
