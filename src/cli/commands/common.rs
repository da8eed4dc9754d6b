//! Helpers shared by CLI commands

use anyhow::{Context, Result};
use std::path::Path;

use archsmith_documents::DocumentFormat;
use archsmith_utils::error::{DocumentError, RequirementError};
use tracing::info;

use crate::{
    ArchsmithError, Category, Config, FileSink, LlmFallbackInfo, Priority, Session, SessionManager,
};

/// One manual requirement as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntry {
    pub text: String,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}

impl ManualEntry {
    pub fn into_parts(self) -> (String, Option<Priority>, Option<Category>) {
        (self.text, self.priority, self.category)
    }
}

/// Parse `text [| Priority: X] [| Category: Y]`.
///
/// Segments that are not a recognised `key: value` pair stay part of the text.
///
/// # Errors
///
/// - `RequirementError::EmptyRequirement` when no text remains
/// - `InvalidPriority` / `InvalidCategory` for unknown values
pub fn parse_manual_entry(line: &str) -> Result<ManualEntry, RequirementError> {
    let mut segments = line.split('|');
    let mut text = segments.next().unwrap_or_default().trim().to_string();
    let mut priority = None;
    let mut category = None;

    for segment in segments {
        let parsed = segment.split_once(':').map(|(k, v)| (k.trim().to_ascii_lowercase(), v));
        match parsed {
            Some((key, value)) if key == "priority" => priority = Some(Priority::parse(value)?),
            Some((key, value)) if key == "category" => category = Some(Category::parse(value)?),
            _ => {
                text.push_str(" |");
                text.push_str(segment.trim_end());
            }
        }
    }

    if text.trim().is_empty() {
        return Err(RequirementError::EmptyRequirement);
    }
    Ok(ManualEntry {
        text: text.trim().to_string(),
        priority,
        category,
    })
}

/// Parse a requirements file: one entry per line, skipping blanks and `#` comments.
///
/// # Errors
///
/// Returns the first entry that fails [`parse_manual_entry`], with its line number.
pub fn parse_requirements_file(content: &str) -> Result<Vec<ManualEntry>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            parse_manual_entry(line)
                .map_err(ArchsmithError::from)
                .with_context(|| format!("line {}", index + 1))
        })
        .collect()
}

/// Read a supporting document from disk, inferring the format from its extension.
///
/// The file name becomes the document label. Files over `max_bytes` are
/// rejected from their metadata without being read.
pub fn load_document(path: &Path, max_bytes: usize) -> Result<(Vec<u8>, DocumentFormat, String)> {
    let format = DocumentFormat::from_path(path).map_err(ArchsmithError::from)?;
    let label = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let size_bytes = std::fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    let size_bytes = usize::try_from(size_bytes).unwrap_or(usize::MAX);
    if size_bytes > max_bytes {
        return Err(ArchsmithError::from(DocumentError::TooLarge {
            label,
            size_bytes,
            max_bytes,
        })
        .into());
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((bytes, format, label))
}

pub fn build_manager(config: Config) -> Result<SessionManager> {
    let (manager, fallback) = crate::session_manager(config)?;
    if let Some(info) = fallback {
        report_fallback(&info);
    }
    Ok(manager)
}

fn report_fallback(info: &LlmFallbackInfo) {
    eprintln!(
        "Provider '{}' unavailable ({}); using '{}'",
        info.primary_provider, info.reason, info.fallback_provider
    );
}

/// Write the assembled document to `out`, or to stdout for `-`.
///
/// Returns the destination actually used.
pub fn export_document(session: &Session, config: &Config, out: Option<&str>) -> Result<String> {
    let destination = out.unwrap_or(&config.export.default_output);
    if destination == "-" {
        let document = session.assembled_document().map_err(ArchsmithError::from)?;
        print!("{}", document.markdown());
        return Ok(destination.to_string());
    }

    let sink = FileSink::from_config(&config.export);
    let document = session.export(&sink, destination)?;
    info!(
        destination,
        digest = document.digest(),
        placeholders = document.fallback_count(),
        "Document written"
    );
    Ok(destination.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_manual_entry_plain_text() {
        let entry = parse_manual_entry("  Staff book meeting rooms  ").unwrap();
        assert_eq!(entry.text, "Staff book meeting rooms");
        assert_eq!(entry.priority, None);
        assert_eq!(entry.category, None);
    }

    #[test]
    fn test_parse_manual_entry_with_attributes() {
        let entry =
            parse_manual_entry("Sync with Outlook | Priority: high | category: Constraint").unwrap();
        assert_eq!(entry.text, "Sync with Outlook");
        assert_eq!(entry.priority, Some(Priority::High));
        assert_eq!(entry.category, Some(Category::Constraint));
    }

    #[test]
    fn test_parse_manual_entry_keeps_unknown_segments() {
        let entry = parse_manual_entry("Support A | B roles | Priority: Low").unwrap();
        assert_eq!(entry.text, "Support A | B roles");
        assert_eq!(entry.priority, Some(Priority::Low));
    }

    #[test]
    fn test_parse_manual_entry_rejects_bad_input() {
        assert!(matches!(
            parse_manual_entry("   | Priority: High"),
            Err(RequirementError::EmptyRequirement)
        ));
        assert!(matches!(
            parse_manual_entry("Login | Priority: urgent"),
            Err(RequirementError::InvalidPriority { .. })
        ));
    }

    #[test]
    fn test_parse_requirements_file_skips_comments() {
        let entries = parse_requirements_file(
            "# booking system\n\nStaff book rooms\n  # indented comment\nRooms show capacity | Category: Functional\n",
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].category, Some(Category::Functional));
    }

    #[test]
    fn test_parse_requirements_file_reports_line() {
        let err = parse_requirements_file("ok\nbad | Category: vibes\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_load_document_rejects_unknown_extension() {
        let err = load_document(Path::new("diagram.vsdx"), 1024).unwrap_err();
        assert!(err.downcast_ref::<ArchsmithError>().is_some());
    }

    #[test]
    fn test_load_document_checks_size_before_reading() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("minutes.txt");
        std::fs::write(&path, "Rooms are booked in half-hour slots.\n".repeat(10)).unwrap();

        let err = load_document(&path, 64).unwrap_err();
        match err.downcast_ref::<ArchsmithError>() {
            Some(ArchsmithError::Document(DocumentError::TooLarge {
                label,
                size_bytes,
                max_bytes,
            })) => {
                assert_eq!(label, "minutes.txt");
                assert_eq!(*size_bytes, 370);
                assert_eq!(*max_bytes, 64);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }

        let (bytes, format, label) = load_document(&path, 1024).unwrap();
        assert_eq!(bytes.len(), 370);
        assert_eq!(format, DocumentFormat::Txt);
        assert_eq!(label, "minutes.txt");
    }

    proptest! {
        #[test]
        fn prop_parse_manual_entry_never_panics(line in ".{0,80}") {
            let _ = parse_manual_entry(&line);
        }

        #[test]
        fn prop_plain_text_is_trimmed_only(text in "[A-Za-z][A-Za-z ]{0,40}") {
            let entry = parse_manual_entry(&text).unwrap();
            prop_assert_eq!(entry.text, text.trim());
            prop_assert!(entry.priority.is_none() && entry.category.is_none());
        }
    }
}
