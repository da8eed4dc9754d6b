//! Text extraction capability
//!
//! The normalizer owns validation and error mapping; extractors only turn raw
//! bytes into text.

use archsmith_utils::text::normalize_line_endings;
use thiserror::Error;

use crate::format::DocumentFormat;

/// Failure reported by a [`TextExtractor`].
///
/// The normalizer maps these into `DocumentError`; they never reach callers raw.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("content is corrupt: {0}")]
    Corrupt(String),

    #[error("content is password protected")]
    PasswordProtected,

    #[error("format {0} is not handled by this extractor")]
    Unsupported(DocumentFormat),

    #[error("extraction failed: {0}")]
    Other(String),
}

pub trait TextExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns an `ExtractionFailure` when the bytes cannot be turned into text
    fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionFailure>;
}

/// Built-in extractor for TXT and Markdown: strict UTF-8, BOM stripped, CRLF normalized.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionFailure> {
        if format.is_binary() {
            return Err(ExtractionFailure::Unsupported(format));
        }
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ExtractionFailure::Corrupt(format!("invalid UTF-8 at byte {}", e.valid_up_to()))
        })?;
        Ok(normalize_line_endings(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bom_and_normalizes_line_endings() {
        let bytes = b"\xEF\xBB\xBFline one\r\nline two\r\n";
        let text = PlainTextExtractor
            .extract(bytes, DocumentFormat::Markdown)
            .unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let err = PlainTextExtractor
            .extract(b"ok \xFF\xFE bad", DocumentFormat::Txt)
            .unwrap_err();
        assert_eq!(err, ExtractionFailure::Corrupt("invalid UTF-8 at byte 3".to_string()));
    }

    #[test]
    fn test_binary_formats_are_not_handled() {
        assert_eq!(
            PlainTextExtractor.extract(b"%PDF-1.7", DocumentFormat::Pdf),
            Err(ExtractionFailure::Unsupported(DocumentFormat::Pdf))
        );
    }
}
