//! Generation context assembly for archsmith
//!
//! A [`ContextAssembler`] snapshots the session's requirements and supporting
//! documents into an immutable [`ContextBundle`] that fits the configured byte
//! budget, and reports what it had to truncate or drop.

mod assembler;
mod budget;
mod bundle;
mod render;

pub use archsmith_utils::error::ContextError;
pub use assembler::ContextAssembler;
pub use budget::{BudgetUsage, ContextBudget};
pub use bundle::{ContextAssembly, ContextBundle, ContextReport, DocumentExcerpt, Truncation};
