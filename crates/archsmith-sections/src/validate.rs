//! Structural validation of generated sections
//!
//! Responses are parsed as CommonMark with `pulldown-cmark`, so headings inside fenced code
//! never count as structure.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

use archsmith_utils::text::normalize_line_endings;

use crate::schema::{REASONING_LABELS, SectionName, SectionShape};

/// Patterns that indicate meta-commentary rather than actual content
static META_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // First-person declarations
        r"(?i)^(I('ve| have| will| am)|Here('s| is)|This is a|Let me)",
        // "I created/generated/produced" anywhere early
        r"(?i)^.{0,50}I('ve| have) (created|generated|produced|written|made)",
        // Enthusiastic starts
        r"(?i)^(Perfect!|Great!|Excellent!|Certainly!|Sure!|Absolutely!|Of course)",
        // "Based on" or "as requested" declarations
        r"(?i)^.{0,30}(based on (the|your)|as (you )?requested)",
        // Summary declarations
        r"(?i)^.{0,50}(here is|below is|the following is) (a |the )?(comprehensive|detailed|complete)",
        // "I'll create" or "I will create"
        r"(?i)^.{0,30}I('ll| will) (create|generate|write|produce)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid meta pattern"))
    .collect()
});

/// `**Field:** value` lines, optionally bulleted
static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-*+][ \t]+)?\*\*([^*\n]+?)\*\*[ \t]*:?[ \t]*(.*)$")
        .expect("valid field pattern")
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+(\.\d+)*[.)]?\s+").expect("valid numbering pattern")
});

const ALLOWED_DIAGRAM_TYPES: &[&str] = &[
    "graph TD",
    "graph LR",
    "flowchart TD",
    "flowchart LR",
    "sequenceDiagram",
];

/// Failure kinds reported back to the generator as corrective guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    MissingSubsection,
    EmptyReasoning,
    MalformedStructure,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSubsection => write!(f, "MissingSubsection"),
            Self::EmptyReasoning => write!(f, "EmptyReasoning"),
            Self::MalformedStructure => write!(f, "MalformedStructure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub detail: String,
}

impl ValidationIssue {
    fn new(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

#[derive(Debug)]
struct Heading {
    level: u8,
    text: String,
    range: Range<usize>,
}

#[derive(Debug)]
struct CodeBlock {
    info: String,
    content: String,
}

#[derive(Debug, Default)]
struct Outline {
    headings: Vec<Heading>,
    code_blocks: Vec<CodeBlock>,
}

fn parse_outline(content: &str) -> Outline {
    let mut outline = Outline::default();
    let mut heading: Option<(u8, String, usize)> = None;
    let mut code: Option<CodeBlock> = None;

    for (event, range) in Parser::new(content).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((level as u8, String::new(), range.start));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text, start)) = heading.take() {
                    outline.headings.push(Heading {
                        level,
                        text: text.trim().to_string(),
                        range: start..range.end,
                    });
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.trim().to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some(CodeBlock {
                    info,
                    content: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code.take() {
                    outline.code_blocks.push(block);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buf, _)) = heading.as_mut() {
                    buf.push_str(&text);
                } else if let Some(block) = code.as_mut() {
                    block.content.push_str(&text);
                }
            }
            _ => {}
        }
    }

    outline
}

/// Comparison form of a heading or field label.
///
/// Case-insensitive, ignores punctuation and leading numbering, and treats `&` as `and`.
fn normalize_label(label: &str) -> String {
    let without_number = LEADING_NUMBER.replace(label, "");
    without_number
        .to_lowercase()
        .replace('&', " and ")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn is_blank(text: &str) -> bool {
    !text.chars().any(char::is_alphanumeric)
}

/// Strip transport noise from a raw model response.
///
/// Normalizes line endings, trims, and unwraps a response that was wrapped whole in a
/// ```` ```markdown ```` fence.
#[must_use]
pub fn normalize_response(raw: &str) -> String {
    let text = normalize_line_endings(raw);
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```")
        && let Some((info, body)) = rest.split_once('\n')
        && matches!(info.trim().to_ascii_lowercase().as_str(), "" | "markdown" | "md")
        && let Some(inner) = body.trim_end().strip_suffix("```")
    {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

fn detect_meta_commentary(content: &str) -> Option<String> {
    let prefix: String = content.chars().take(200).collect();
    META_PATTERNS
        .iter()
        .find_map(|p| p.find(&prefix).map(|m| m.as_str().to_string()))
}

/// Body of the heading at `index`: text up to the next heading of the same or higher level.
fn body_of<'a>(content: &'a str, headings: &[Heading], index: usize) -> &'a str {
    let level = headings[index].level;
    let start = headings[index].range.end;
    let end = headings[index + 1..]
        .iter()
        .find(|h| h.level <= level)
        .map_or(content.len(), |h| h.range.start);
    &content[start..end]
}

fn empty_issue(label: &str, what: &str) -> ValidationIssue {
    if REASONING_LABELS
        .iter()
        .any(|r| normalize_label(r) == normalize_label(label))
    {
        ValidationIssue::new(
            IssueKind::EmptyReasoning,
            format!("{what} `{label}` has no reasoning"),
        )
    } else {
        ValidationIssue::new(
            IssueKind::MissingSubsection,
            format!("{what} `{label}` has no content"),
        )
    }
}

fn check_subsections(
    content: &str,
    outline: &Outline,
    required: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    for label in required {
        let wanted = normalize_label(label);
        let found = outline
            .headings
            .iter()
            .position(|h| h.level == 3 && normalize_label(&h.text) == wanted);
        match found {
            None => issues.push(ValidationIssue::new(
                IssueKind::MissingSubsection,
                format!("missing subsection `### {label}`"),
            )),
            Some(index) => {
                if is_blank(body_of(content, &outline.headings, index)) {
                    issues.push(empty_issue(label, "subsection"));
                }
            }
        }
    }
}

/// Field name to value for every `**Field:** value` line in `body`.
fn parse_fields(body: &str) -> Vec<(String, String)> {
    let matches: Vec<_> = FIELD_LINE.captures_iter(body).collect();
    let mut fields = Vec::with_capacity(matches.len());
    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(name), Some(first_line)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let continuation_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |m| m.start());
        let mut value = first_line.as_str().to_string();
        value.push_str(&body[whole.end()..continuation_end]);
        let name = name.as_str().trim().trim_end_matches(':').trim().to_string();
        fields.push((name, value));
    }
    fields
}

fn check_components(
    content: &str,
    outline: &Outline,
    required: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    let components: Vec<usize> = outline
        .headings
        .iter()
        .enumerate()
        .filter(|(_, h)| h.level == 3)
        .map(|(i, _)| i)
        .collect();

    if components.is_empty() {
        issues.push(ValidationIssue::new(
            IssueKind::MissingSubsection,
            "no `### <Component>` entries found",
        ));
        return;
    }

    for index in components {
        let component = &outline.headings[index].text;
        let fields = parse_fields(body_of(content, &outline.headings, index));
        for label in required {
            let wanted = normalize_label(label);
            match fields.iter().find(|(name, _)| normalize_label(name) == wanted) {
                None => issues.push(ValidationIssue::new(
                    IssueKind::MissingSubsection,
                    format!("component `{component}` is missing field `{label}`"),
                )),
                Some((_, value)) if is_blank(value) => {
                    issues.push(empty_issue(label, &format!("component `{component}` field")));
                }
                Some(_) => {}
            }
        }
    }
}

fn check_diagram(outline: &Outline, issues: &mut Vec<ValidationIssue>) {
    let Some(block) = outline
        .code_blocks
        .iter()
        .find(|b| b.info.to_ascii_lowercase().starts_with("mermaid"))
    else {
        issues.push(ValidationIssue::new(
            IssueKind::MalformedStructure,
            "missing fenced ```mermaid diagram block",
        ));
        return;
    };

    let first_line = block
        .content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("%%"))
        .unwrap_or_default();
    let declared: String = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if !ALLOWED_DIAGRAM_TYPES.iter().any(|t| declared == *t) {
        issues.push(ValidationIssue::new(
            IssueKind::MalformedStructure,
            format!(
                "mermaid diagram type `{declared}` is not allowed; use one of: {}",
                ALLOWED_DIAGRAM_TYPES.join(", ")
            ),
        ));
    }

    if block.content.contains("C4Context")
        || block.content.contains("C4Container")
        || block.content.contains("C4_")
    {
        issues.push(ValidationIssue::new(
            IssueKind::MalformedStructure,
            "mermaid diagram uses C4 syntax",
        ));
    }
}

/// Validate a model response for `name`.
///
/// Returns the normalized section text when it satisfies the section schema, otherwise
/// every issue found.
///
/// # Errors
///
/// Returns the list of [`ValidationIssue`]s when the response does not satisfy the schema.
pub fn validate_section(name: SectionName, raw: &str) -> Result<String, Vec<ValidationIssue>> {
    let content = normalize_response(raw);
    let mut issues = Vec::new();

    if content.is_empty() {
        return Err(vec![ValidationIssue::new(
            IssueKind::MalformedStructure,
            "response is empty",
        )]);
    }

    if let Some(pattern) = detect_meta_commentary(&content) {
        issues.push(ValidationIssue::new(
            IssueKind::MalformedStructure,
            format!("response opens with meta-commentary ('{pattern}')"),
        ));
    }

    let outline = parse_outline(&content);
    let title = name.title();

    match outline.headings.first() {
        Some(first) if first.level == 2 && content[..first.range.start].trim().is_empty() => {
            if normalize_label(&first.text) != normalize_label(title) {
                issues.push(ValidationIssue::new(
                    IssueKind::MalformedStructure,
                    format!("expected heading `## {title}`, found `## {}`", first.text),
                ));
            }
        }
        _ => issues.push(ValidationIssue::new(
            IssueKind::MalformedStructure,
            format!("response must start with the heading `## {title}`"),
        )),
    }

    for extra in outline.headings.iter().skip(1).filter(|h| h.level <= 2) {
        issues.push(ValidationIssue::new(
            IssueKind::MalformedStructure,
            format!("unexpected top-level heading `{}`; produce only this section", extra.text),
        ));
    }

    match name.schema().shape {
        SectionShape::Subsections(required) => {
            check_subsections(&content, &outline, required, &mut issues);
        }
        SectionShape::Components(fields) => {
            check_components(&content, &outline, fields, &mut issues);
        }
        SectionShape::Diagram(required) => {
            check_subsections(&content, &outline, required, &mut issues);
            check_diagram(&outline, &mut issues);
        }
    }

    if issues.is_empty() {
        Ok(content)
    } else {
        debug!(
            section = name.slug(),
            issue_count = issues.len(),
            "Section failed validation"
        );
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(label: &str) -> String {
        format!("Concrete details about {label} for the ordering platform.")
    }

    fn kinds(issues: &[ValidationIssue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_every_skeleton_validates() {
        for name in SectionName::ALL {
            let text = name.schema().skeleton(filler);
            assert!(
                validate_section(name, &text).is_ok(),
                "skeleton for {name} should validate: {:?}",
                validate_section(name, &text)
            );
        }
    }

    #[test]
    fn test_missing_subsection_reported() {
        let text = "## Executive Summary\n\n### Overview\n\nAn order platform.\n";
        let issues = validate_section(SectionName::ExecutiveSummary, text).unwrap_err();
        assert_eq!(kinds(&issues), vec![IssueKind::MissingSubsection]);
        assert!(issues[0].detail.contains("Key Decisions"));
    }

    #[test]
    fn test_empty_reasoning_subsection() {
        let text = "## Architecture Pattern & Reasoning\n\n### Pattern\n\nModular monolith.\n\n\
                    ### Reasoning\n\n\n### Alternatives Considered\n\nMicroservices.\n";
        let issues = validate_section(SectionName::ArchitecturePattern, text).unwrap_err();
        assert_eq!(kinds(&issues), vec![IssueKind::EmptyReasoning]);
    }

    #[test]
    fn test_subsection_matching_ignores_case_punctuation_and_numbering() {
        let text = "## 8. Integration Points\n\n### external integrations\n\nStripe.\n\n\
                    ### API design\n\nREST.\n\n### Authentication and Authorization\n\nOIDC.\n";
        assert!(validate_section(SectionName::IntegrationPoints, text).is_ok());
    }

    #[test]
    fn test_component_missing_interactions() {
        let text = "## System Components\n\n### Order Service\n\n**Purpose:** Accepts orders.\n\
                    **Technology:** Rust with axum.\n**Reasoning:** Low latency.\n";
        let issues = validate_section(SectionName::SystemComponents, text).unwrap_err();
        assert_eq!(kinds(&issues), vec![IssueKind::MissingSubsection]);
        assert!(issues[0].detail.contains("Interactions"));
        assert!(issues[0].detail.contains("Order Service"));
    }

    #[test]
    fn test_component_empty_reasoning_field() {
        let text = "## System Components\n\n### Order Service\n\n- **Purpose:** Accepts orders.\n\
                    - **Technology:** Rust.\n- **Reasoning:**\n- **Interactions:** Talks to billing.\n";
        let issues = validate_section(SectionName::SystemComponents, text).unwrap_err();
        assert_eq!(kinds(&issues), vec![IssueKind::EmptyReasoning]);
    }

    #[test]
    fn test_component_field_value_may_continue_on_next_line() {
        let text = "## System Components\n\n### Gateway\n\n**Purpose:**\nRoutes traffic.\n\
                    **Technology:** Envoy.\n**Reasoning:** Mature.\n**Interactions:** All services.\n";
        assert!(validate_section(SectionName::SystemComponents, text).is_ok());
    }

    #[test]
    fn test_meta_commentary_is_malformed() {
        let body = SectionName::DataArchitecture.schema().skeleton(filler);
        let text = format!("Here is the data architecture section:\n\n{body}");
        let issues = validate_section(SectionName::DataArchitecture, &text).unwrap_err();
        assert!(kinds(&issues).contains(&IssueKind::MalformedStructure));
    }

    #[test]
    fn test_wrong_heading_and_extra_sections() {
        let text = SectionName::TradeOffs.schema().skeleton(filler);
        let issues = validate_section(SectionName::DataArchitecture, &text).unwrap_err();
        assert!(issues.iter().any(|i| i.detail.contains("expected heading")));

        let doubled = format!(
            "{}\n\n## Technology Stack\n\nExtra.",
            SectionName::TradeOffs.schema().skeleton(filler)
        );
        let issues = validate_section(SectionName::TradeOffs, &doubled).unwrap_err();
        assert!(issues.iter().any(|i| i.detail.contains("unexpected top-level heading")));
    }

    #[test]
    fn test_headings_inside_code_fences_are_ignored() {
        let text = "## Executive Summary\n\n### Overview\n\n```text\n### Key Decisions\n```\n";
        let issues = validate_section(SectionName::ExecutiveSummary, text).unwrap_err();
        assert!(issues.iter().any(|i| i.detail.contains("Key Decisions")));
    }

    #[test]
    fn test_wrapped_markdown_fence_is_unwrapped() {
        let body = SectionName::DeploymentStrategy.schema().skeleton(filler);
        let wrapped = format!("```markdown\n{body}\n```");
        assert_eq!(
            validate_section(SectionName::DeploymentStrategy, &wrapped).ok(),
            Some(body)
        );
    }

    #[test]
    fn test_diagram_rules() {
        let ok = "## Architecture Diagram Description\n\n### Description\n\nRequest flow.\n\n\
                  ```mermaid\nflowchart LR\n  A[Client] --> B[API]\n```\n";
        assert!(validate_section(SectionName::ArchitectureDiagram, ok).is_ok());

        let c4 = "## Architecture Diagram Description\n\n### Description\n\nFlow.\n\n\
                  ```mermaid\nC4Context\n  Person(u, \"User\")\n```\n";
        let issues = validate_section(SectionName::ArchitectureDiagram, c4).unwrap_err();
        assert!(issues.iter().all(|i| i.kind == IssueKind::MalformedStructure));
        assert_eq!(issues.len(), 2);

        let missing = "## Architecture Diagram Description\n\n### Description\n\nFlow only.\n";
        let issues = validate_section(SectionName::ArchitectureDiagram, missing).unwrap_err();
        assert!(issues[0].detail.contains("mermaid"));
    }
}
