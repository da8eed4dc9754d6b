use serde::Serialize;

use crate::format::{DocumentFormat, DocumentKind};

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// File name or other label supplied at upload
    pub label: String,
    pub kind: DocumentKind,
    /// BLAKE3 hex digest of the raw uploaded bytes
    pub digest: String,
}

/// A normalized supporting document. Read-only once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportingDocument {
    id: String,
    format: DocumentFormat,
    extracted_text: String,
    size_bytes: usize,
    provenance: Provenance,
}

impl SupportingDocument {
    pub(crate) fn new(
        format: DocumentFormat,
        extracted_text: String,
        size_bytes: usize,
        provenance: Provenance,
    ) -> Self {
        let id = format!("doc-{}", &provenance.digest[..12.min(provenance.digest.len())]);
        Self {
            id,
            format,
            extracted_text,
            size_bytes,
            provenance,
        }
    }

    /// `doc-` plus the first 12 hex digits of the content digest, so identical
    /// uploads share an id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    #[must_use]
    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    /// Size of the raw upload, not of the extracted text.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.provenance.label
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.provenance.kind
    }
}
