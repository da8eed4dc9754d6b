//! Resolved sections → final architecture document
//!
//! Output depends only on the section results, so an unchanged session always
//! assembles to the same bytes and digest.

use anyhow::Result;
use archsmith_sections::SectionName;
use archsmith_utils::canonical::{blake3_hex, to_canonical_json};
use archsmith_utils::error::SessionError;
use serde::Serialize;

use crate::result::{SectionResult, SectionStatus};

pub const DOCUMENT_TITLE: &str = "Solution Architecture Document";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSection {
    pub number: usize,
    pub slug: &'static str,
    pub title: &'static str,
    pub status: SectionStatus,
    pub attempt_count: u32,
    pub content: String,
}

/// Structured form of the document, serialized as canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentManifest {
    pub title: &'static str,
    pub sections: Vec<ManifestSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    markdown: String,
    digest: String,
    manifest: DocumentManifest,
}

impl AssembledDocument {
    #[must_use]
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// BLAKE3 hex digest of [`markdown`](Self::markdown).
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    #[must_use]
    pub fn manifest(&self) -> &DocumentManifest {
        &self.manifest
    }

    /// RFC 8785 rendering of the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    pub fn canonical_json(&self) -> Result<String> {
        to_canonical_json(&self.manifest)
    }

    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.manifest
            .sections
            .iter()
            .filter(|s| s.status == SectionStatus::FailedFallback)
            .count()
    }
}

/// Assemble the document from one resolved result per section.
///
/// # Errors
///
/// Returns `SessionError::NotAssemblable` if a section is missing or still pending.
pub fn assemble_document(sections: &[SectionResult]) -> Result<AssembledDocument, SessionError> {
    let mut ordered = Vec::with_capacity(SectionName::ALL.len());
    for name in SectionName::ALL {
        match sections.iter().find(|s| s.name() == name) {
            Some(section) if section.status().is_resolved() => ordered.push(section),
            _ => {
                return Err(SessionError::NotAssemblable {
                    phase: format!("generating (section '{}' unresolved)", name.slug()),
                });
            }
        }
    }

    let mut markdown = format!("# {DOCUMENT_TITLE}\n\n## Contents\n\n");
    for section in &ordered {
        let name = section.name();
        let marker = if section.status() == SectionStatus::FailedFallback {
            " (placeholder)"
        } else {
            ""
        };
        markdown.push_str(&format!("{}. {}{marker}\n", name.number(), name.title()));
    }

    for section in &ordered {
        let name = section.name();
        markdown.push_str(&format!("\n## {}. {}\n\n", name.number(), name.title()));
        markdown.push_str(body_without_heading(section.content()));
        markdown.push('\n');
    }

    let manifest = DocumentManifest {
        title: DOCUMENT_TITLE,
        sections: ordered
            .iter()
            .map(|s| ManifestSection {
                number: s.name().number(),
                slug: s.name().slug(),
                title: s.name().title(),
                status: s.status(),
                attempt_count: s.attempt_count(),
                content: s.content().to_string(),
            })
            .collect(),
    };

    Ok(AssembledDocument {
        digest: blake3_hex(markdown.as_bytes()),
        markdown,
        manifest,
    })
}

/// Section content minus its leading `## Title` line.
fn body_without_heading(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("## ") {
        Some(rest) => rest.split_once('\n').map_or("", |(_, body)| body.trim()),
        None => trimmed,
    }
}
