//! Raw upload → [`SupportingDocument`]

use std::collections::HashMap;
use std::sync::Arc;

use archsmith_config::DocumentsConfig;
use archsmith_utils::canonical::blake3_hex;
use archsmith_utils::error::DocumentError;
use archsmith_utils::logging::redact_error_message;
use tracing::debug;

use crate::binary::{DocxExtractor, PdfExtractor};
use crate::document::{Provenance, SupportingDocument};
use crate::extractor::{ExtractionFailure, PlainTextExtractor, TextExtractor};
use crate::format::{DocumentFormat, DocumentKind};

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PDF_ENCRYPT_KEY: &[u8] = b"/Encrypt";

/// Validates uploads and runs the extractor registered for their format.
///
/// All four formats have a built-in extractor; [`DocumentNormalizer::with_extractor`]
/// swaps one out.
#[derive(Clone)]
pub struct DocumentNormalizer {
    max_bytes: usize,
    extractors: HashMap<DocumentFormat, Arc<dyn TextExtractor>>,
}

impl DocumentNormalizer {
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        let plain: Arc<dyn TextExtractor> = Arc::new(PlainTextExtractor);
        let mut extractors = HashMap::new();
        extractors.insert(DocumentFormat::Txt, Arc::clone(&plain));
        extractors.insert(DocumentFormat::Markdown, plain);
        extractors.insert(DocumentFormat::Pdf, Arc::new(PdfExtractor) as Arc<dyn TextExtractor>);
        extractors.insert(DocumentFormat::Docx, Arc::new(DocxExtractor) as Arc<dyn TextExtractor>);
        Self {
            max_bytes,
            extractors,
        }
    }

    #[must_use]
    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self::new(config.max_bytes)
    }

    /// Register (or replace) the extractor for `format`.
    #[must_use]
    pub fn with_extractor(mut self, format: DocumentFormat, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(format, extractor);
        self
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Turn raw bytes into a [`SupportingDocument`].
    ///
    /// The size limit is checked before any parsing.
    ///
    /// # Errors
    ///
    /// - `TooLarge` when `bytes` exceeds the configured maximum
    /// - `Corrupt` on a signature mismatch, undecodable content or empty text
    /// - `PasswordProtected` for encrypted PDFs
    /// - `UnsupportedFormat` when no extractor is registered for `format`
    pub fn normalize(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        label: &str,
    ) -> Result<SupportingDocument, DocumentError> {
        if bytes.len() > self.max_bytes {
            debug!(
                label,
                size_bytes = bytes.len(),
                max_bytes = self.max_bytes,
                "Rejecting oversized document"
            );
            return Err(DocumentError::TooLarge {
                label: label.to_string(),
                size_bytes: bytes.len(),
                max_bytes: self.max_bytes,
            });
        }

        check_container(bytes, format, label)?;

        let extractor =
            self.extractors
                .get(&format)
                .ok_or_else(|| DocumentError::UnsupportedFormat {
                    format: format!("{format} (no extractor registered)"),
                })?;

        let text = extractor
            .extract(bytes, format)
            .map_err(|failure| map_failure(failure, label))?;

        if text.trim().is_empty() {
            return Err(DocumentError::Corrupt {
                label: label.to_string(),
                reason: "no extractable text".to_string(),
            });
        }

        let provenance = Provenance {
            label: label.to_string(),
            kind: DocumentKind::classify(label),
            digest: blake3_hex(bytes),
        };
        let document = SupportingDocument::new(format, text, bytes.len(), provenance);

        debug!(
            id = document.id(),
            label,
            %format,
            kind = %document.kind(),
            size_bytes = document.size_bytes(),
            text_bytes = document.extracted_text().len(),
            "Normalized document"
        );

        Ok(document)
    }
}

/// Signature checks for binary containers.
fn check_container(bytes: &[u8], format: DocumentFormat, label: &str) -> Result<(), DocumentError> {
    let corrupt = |reason: &str| DocumentError::Corrupt {
        label: label.to_string(),
        reason: reason.to_string(),
    };

    match format {
        DocumentFormat::Pdf => {
            if !bytes.starts_with(PDF_MAGIC) {
                return Err(corrupt("missing %PDF- header"));
            }
            if bytes
                .windows(PDF_ENCRYPT_KEY.len())
                .any(|w| w == PDF_ENCRYPT_KEY)
            {
                return Err(DocumentError::PasswordProtected {
                    label: label.to_string(),
                });
            }
        }
        DocumentFormat::Docx => {
            if !bytes.starts_with(ZIP_MAGIC) {
                return Err(corrupt("not a ZIP container"));
            }
        }
        DocumentFormat::Txt | DocumentFormat::Markdown => {}
    }
    Ok(())
}

fn map_failure(failure: ExtractionFailure, label: &str) -> DocumentError {
    match failure {
        ExtractionFailure::Corrupt(reason) => DocumentError::Corrupt {
            label: label.to_string(),
            reason,
        },
        ExtractionFailure::PasswordProtected => DocumentError::PasswordProtected {
            label: label.to_string(),
        },
        ExtractionFailure::Unsupported(format) => DocumentError::UnsupportedFormat {
            format: format.to_string(),
        },
        ExtractionFailure::Other(message) => DocumentError::Corrupt {
            label: label.to_string(),
            reason: redact_error_message(&message),
        },
    }
}
