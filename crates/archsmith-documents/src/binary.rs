//! Extractors for the binary upload formats: PDF and DOCX

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use lopdf::Document as PdfDocument;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::extractor::{ExtractionFailure, TextExtractor};
use crate::format::DocumentFormat;

const DOCX_BODY: &str = "word/document.xml";

/// Reads paragraph text out of `word/document.xml`.
///
/// Paragraphs become lines; tabs and manual breaks are kept. Headers, footers
/// and comments live in other parts of the package and are not read.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionFailure> {
        if format != DocumentFormat::Docx {
            return Err(ExtractionFailure::Unsupported(format));
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionFailure::Corrupt(format!("unreadable ZIP container: {e}")))?;
        let mut body = String::new();
        match archive.by_name(DOCX_BODY) {
            Ok(mut entry) => {
                entry
                    .read_to_string(&mut body)
                    .map_err(|e| ExtractionFailure::Corrupt(format!("{DOCX_BODY}: {e}")))?;
            }
            Err(ZipError::FileNotFound) => {
                return Err(ExtractionFailure::Corrupt(format!("missing {DOCX_BODY}")));
            }
            Err(e) => return Err(ExtractionFailure::Corrupt(format!("{DOCX_BODY}: {e}"))),
        }
        docx_body_text(&body)
    }
}

fn docx_body_text(xml: &str) -> Result<String, ExtractionFailure> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionFailure::Corrupt(format!("malformed document XML: {e}")))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .decode()
                    .map_err(|e| ExtractionFailure::Corrupt(format!("bad text run: {e}")))?;
                out.push_str(&text);
            }
            Event::GeneralRef(r) if in_text => {
                if let Ok(Some(ch)) = r.resolve_char_ref() {
                    out.push(ch);
                } else {
                    let name = r
                        .decode()
                        .map_err(|e| ExtractionFailure::Corrupt(format!("bad entity: {e}")))?;
                    if let Some(value) = quick_xml::escape::resolve_xml_entity(&name) {
                        out.push_str(value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Page-ordered text from a PDF, one block per page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionFailure> {
        if format != DocumentFormat::Pdf {
            return Err(ExtractionFailure::Unsupported(format));
        }
        let document = PdfDocument::load_mem(bytes)
            .map_err(|e| ExtractionFailure::Corrupt(format!("unreadable PDF: {e}")))?;
        if document.is_encrypted() {
            return Err(ExtractionFailure::PasswordProtected);
        }

        let pages: BTreeMap<u32, _> = document.get_pages();
        let mut out = String::new();
        for number in pages.keys() {
            match document.extract_text(&[*number]) {
                Ok(text) => {
                    out.push_str(text.trim_end());
                    out.push('\n');
                }
                // Image-only or oddly encoded pages carry no usable text.
                Err(e) => debug!(page = *number, error = %e, "Skipping unreadable PDF page"),
            }
        }
        Ok(out)
    }
}
