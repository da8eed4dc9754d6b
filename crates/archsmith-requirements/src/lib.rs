//! Structured requirements for archsmith
//!
//! Requirements come from three places: model extraction over the chat
//! transcript, manual entry, and (optionally) extraction over supporting
//! documents. All of them pass through a [`RequirementSet`], which assigns
//! `REQ-nnn` ids and drops duplicates.

mod extractor;
mod model;
mod parse;
mod set;
mod transcript;

pub use archsmith_utils::error::RequirementError;
pub use extractor::{ExtractionSettings, RequirementExtractor};
pub use model::{Category, Priority, Requirement, RequirementDraft, RequirementSource};
pub use parse::{LineRejection, parse_extraction_output, parse_requirement_line};
pub use set::RequirementSet;
pub use transcript::{ConversationTurn, TurnRole, render_transcript};

/// Validate manual entries, all or nothing.
///
/// Each item is `(text, priority, category)`; missing classification defaults to
/// Medium / Functional.
///
/// # Errors
///
/// Returns `RequirementError::EmptyRequirement` if any text is blank
pub fn from_manual<I, S>(items: I) -> Result<Vec<RequirementDraft>, RequirementError>
where
    I: IntoIterator<Item = (S, Option<Priority>, Option<Category>)>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|(text, priority, category)| RequirementDraft::manual(text, priority, category))
        .collect()
}
