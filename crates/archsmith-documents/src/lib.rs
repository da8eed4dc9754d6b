//! Supporting document intake for archsmith
//!
//! Uploads arrive as raw bytes with a declared format and a label (usually the
//! file name). [`DocumentNormalizer`] enforces the size limit, checks binary
//! container signatures, runs the registered [`TextExtractor`] and returns an
//! immutable [`SupportingDocument`] carrying its provenance.

mod binary;
mod document;
mod extractor;
mod format;
mod normalizer;

pub use archsmith_utils::error::DocumentError;
pub use binary::{DocxExtractor, PdfExtractor};
pub use document::{Provenance, SupportingDocument};
pub use extractor::{ExtractionFailure, PlainTextExtractor, TextExtractor};
pub use format::{DocumentFormat, DocumentKind};
pub use normalizer::DocumentNormalizer;
