//! Configuration management for archsmith
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > config file > programmatic > defaults.
//!
//! Config files are TOML with optional `[llm]`, `[conversation]`, `[documents]`,
//! `[context]`, `[generation]` and `[export]` tables:
//!
//! ```toml
//! [llm]
//! provider = "anthropic"
//! call_budget = 40
//!
//! [llm.anthropic]
//! model = "claude-sonnet-4-20250514"
//!
//! [conversation]
//! max_turns = 8
//!
//! [generation]
//! max_attempts = 2
//! ```

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use archsmith_utils::types::ConfigSource;
pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
