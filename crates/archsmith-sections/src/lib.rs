//! Section schemas and output validation for architecture documents
//!
//! An architecture document is ten sections in a fixed order. Each [`SectionName`] has a
//! [`SectionSchema`] describing the subsections (or component fields) the model must
//! produce; [`validate_section`] checks a model response against it and returns the
//! [`ValidationIssue`]s that drive retries.

mod prompts;
mod schema;
mod validate;

pub use prompts::{ANTI_SUMMARY_INSTRUCTIONS, MERMAID_RULES, section_guidance};
pub use schema::{SectionName, SectionSchema, SectionShape};
pub use validate::{IssueKind, ValidationIssue, normalize_response, validate_section};
