use serde::Serialize;
use std::sync::Arc;

use archsmith_documents::{DocumentFormat, DocumentKind, SupportingDocument};
use archsmith_requirements::Requirement;

use crate::budget::BudgetUsage;

/// A document as it appears in a context bundle, possibly cut to a lead excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentExcerpt {
    id: String,
    label: String,
    kind: DocumentKind,
    format: DocumentFormat,
    text: String,
    original_bytes: usize,
}

impl DocumentExcerpt {
    pub(crate) fn new(document: &SupportingDocument, text: &str) -> Self {
        Self {
            id: document.id().to_string(),
            label: document.label().to_string(),
            kind: document.kind(),
            format: document.format(),
            text: text.to_string(),
            original_bytes: document.extracted_text().len(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    #[must_use]
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the full extracted text.
    #[must_use]
    pub fn original_bytes(&self) -> usize {
        self.original_bytes
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.text.len() < self.original_bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub document_id: String,
    pub original_bytes: usize,
    pub kept_bytes: usize,
}

/// What the assembler had to cut to fit the budget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextReport {
    pub truncated: Vec<Truncation>,
    /// Ids of documents left out entirely, in drop order
    pub dropped: Vec<String>,
}

impl ContextReport {
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        self.truncated.is_empty() && self.dropped.is_empty()
    }
}

/// Immutable snapshot of requirements and document text for one generation run.
///
/// There is no mutating API; share it as `Arc<ContextBundle>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextBundle {
    requirements: Vec<Requirement>,
    documents: Vec<DocumentExcerpt>,
    usage: BudgetUsage,
    report: ContextReport,
}

impl ContextBundle {
    pub(crate) fn new(
        requirements: Vec<Requirement>,
        documents: Vec<DocumentExcerpt>,
        usage: BudgetUsage,
        report: ContextReport,
    ) -> Self {
        Self {
            requirements,
            documents,
            usage,
            report,
        }
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    #[must_use]
    pub fn documents(&self) -> &[DocumentExcerpt] {
        &self.documents
    }

    #[must_use]
    pub fn usage(&self) -> BudgetUsage {
        self.usage
    }

    #[must_use]
    pub fn size_budget(&self) -> usize {
        self.usage.max_bytes
    }

    /// Bytes of the budget not used by requirements and documents.
    #[must_use]
    pub fn remaining_headroom(&self) -> usize {
        self.usage.remaining()
    }

    #[must_use]
    pub fn report(&self) -> &ContextReport {
        &self.report
    }
}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct ContextAssembly {
    pub bundle: Arc<ContextBundle>,
    pub report: ContextReport,
}
