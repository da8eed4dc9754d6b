//! Foundation utilities shared by every archsmith crate.
//!
//! - [`error`]: the typed error taxonomy and user-facing error reporting
//! - [`exit_codes`]: process exit codes for the CLI
//! - [`logging`]: tracing subscriber setup and message redaction
//! - [`atomic_write`]: temp-file + fsync + rename writes
//! - [`text`]: normalization, dedup keys and char-boundary truncation
//! - [`canonical`]: BLAKE3 digests and JCS canonical JSON
//! - [`types`]: small enums shared across crates

pub mod atomic_write;
pub mod canonical;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod text;
pub mod types;

pub use error::{ArchsmithError, ErrorCategory, UserFriendlyError};
pub use exit_codes::ExitCode;
pub use types::ConfigSource;
