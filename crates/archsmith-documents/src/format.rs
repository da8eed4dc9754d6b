use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use archsmith_utils::error::DocumentError;

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
    Markdown,
}

impl DocumentFormat {
    pub const ALL: [Self; 4] = [Self::Pdf, Self::Docx, Self::Txt, Self::Markdown];

    /// Parse a format tag such as `pdf`, `TXT` or `markdown`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnsupportedFormat` for anything else
    pub fn parse(tag: &str) -> Result<Self, DocumentError> {
        match tag.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "text" => Ok(Self::Txt),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(DocumentError::UnsupportedFormat {
                format: tag.to_string(),
            }),
        }
    }

    /// Format implied by a file's extension.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnsupportedFormat` when the extension is missing or unknown
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            DocumentError::UnsupportedFormat {
                format: path.display().to_string(),
            }
        })?;
        Self::parse(ext)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Markdown => "markdown",
        }
    }

    /// Binary containers are signature-checked before extraction.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }
}

impl FromStr for DocumentFormat {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a document is about, guessed from its file name and shown in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Requirements,
    Specification,
    Design,
    ApiDocumentation,
    General,
}

impl DocumentKind {
    /// Checked in order: `requirement`/`req`, `spec`, `design`, `api`.
    #[must_use]
    pub fn classify(label: &str) -> Self {
        let name = Path::new(label)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(label)
            .to_lowercase();

        if name.contains("req") {
            Self::Requirements
        } else if name.contains("spec") {
            Self::Specification
        } else if name.contains("design") {
            Self::Design
        } else if name.contains("api") {
            Self::ApiDocumentation
        } else {
            Self::General
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::Specification => "specification",
            Self::Design => "design",
            Self::ApiDocumentation => "api_documentation",
            Self::General => "general",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
