//! Strict parsing of model extraction output
//!
//! Each candidate must be one line of the form
//! `REQn: <text> | Priority: <High|Medium|Low> | Category: <category>`.
//! Anything else is rejected and logged; nothing is guessed.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use archsmith_utils::error::RequirementError;

use crate::model::{Category, Priority, RequirementDraft, RequirementSource};

static REQUIREMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*]\s+)?\**REQ-?\d+\**\s*[:.)]\s*(?P<text>.+?)\s*\|\s*\**Priority\**\s*:\s*(?P<priority>[^|]+?)\s*\|\s*\**Category\**\s*:\s*(?P<category>[^|]+?)\s*$",
    )
    .expect("valid requirement line pattern")
});

/// Why a line was not accepted as a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRejection {
    /// The line does not follow the `REQn: … | Priority: … | Category: …` shape
    Shape,
    /// The shape matched but a field failed validation
    Field(RequirementError),
}

/// Parse one candidate line.
///
/// # Errors
///
/// Returns a [`LineRejection`] describing why the line was not accepted
pub fn parse_requirement_line(
    line: &str,
    source: RequirementSource,
) -> Result<RequirementDraft, LineRejection> {
    let caps = REQUIREMENT_LINE.captures(line).ok_or(LineRejection::Shape)?;
    let priority = Priority::parse(&caps["priority"]).map_err(LineRejection::Field)?;
    let category = Category::parse(&caps["category"]).map_err(LineRejection::Field)?;
    RequirementDraft::new(&caps["text"], priority, category, source).map_err(LineRejection::Field)
}

/// All valid requirement lines in `output`, in order.
///
/// Blank lines and a bare `NONE` are skipped silently; other rejected lines
/// are logged at debug level.
#[must_use]
pub fn parse_extraction_output(output: &str, source: RequirementSource) -> Vec<RequirementDraft> {
    let mut drafts = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed.starts_with("```")
        {
            continue;
        }
        match parse_requirement_line(trimmed, source) {
            Ok(draft) => drafts.push(draft),
            Err(reason) => debug!(line = trimmed, ?reason, "Rejected extraction line"),
        }
    }
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_canonical_line() {
        let draft = parse_requirement_line(
            "REQ1: Users can book meeting rooms | Priority: High | Category: Functional",
            RequirementSource::Chat,
        )
        .unwrap();
        assert_eq!(draft.text(), "Users can book meeting rooms");
        assert_eq!(draft.priority(), Priority::High);
        assert_eq!(draft.category(), Category::Functional);
    }

    #[test]
    fn test_accepts_bullets_bold_labels_and_synonyms() {
        let draft = parse_requirement_line(
            "- **REQ-12**: Respond within 200 ms | **Priority**: medium | **Category**: NFR",
            RequirementSource::Document,
        )
        .unwrap();
        assert_eq!(draft.category(), Category::NonFunctional);
        assert_eq!(draft.source(), RequirementSource::Document);
    }

    #[test]
    fn test_rejects_wrong_shape_and_bad_fields() {
        assert_eq!(
            parse_requirement_line("Users can book rooms", RequirementSource::Chat),
            Err(LineRejection::Shape)
        );
        assert_eq!(
            parse_requirement_line(
                "REQ1: Book rooms | Priority: Urgent | Category: Functional",
                RequirementSource::Chat
            ),
            Err(LineRejection::Field(RequirementError::InvalidPriority {
                value: "Urgent".to_string()
            }))
        );
        assert!(matches!(
            parse_requirement_line(
                "REQ1: Book rooms | Priority: Low | Category: Vibes",
                RequirementSource::Chat
            ),
            Err(LineRejection::Field(RequirementError::InvalidCategory { .. }))
        ));
        assert!(parse_requirement_line(
            "REQ1: Book rooms | Category: Functional",
            RequirementSource::Chat
        )
        .is_err());
    }

    #[test]
    fn test_output_with_noise_keeps_only_valid_lines() {
        let output = "Here are the requirements:\n\n\
                      REQ1: Book rooms | Priority: High | Category: Functional\n\
                      REQ2: | Priority: High | Category: Functional\n\
                      REQ3: Encrypt data at rest | Priority: High | Category: Quality\n";
        let drafts = parse_extraction_output(output, RequirementSource::Chat);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].text(), "Encrypt data at rest");
    }

    #[test]
    fn test_none_output_is_empty() {
        assert!(parse_extraction_output("NONE", RequirementSource::Chat).is_empty());
        assert!(parse_extraction_output("", RequirementSource::Chat).is_empty());
    }
}
