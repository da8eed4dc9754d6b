use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use archsmith_utils::error::RequirementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// # Errors
    ///
    /// Returns `RequirementError::InvalidPriority` for unknown names
    pub fn parse(value: &str) -> Result<Self, RequirementError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" | "med" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(RequirementError::InvalidPriority {
                value: value.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Functional,
    NonFunctional,
    Constraint,
}

impl Category {
    /// Parse a category name, accepting the synonyms models commonly emit.
    ///
    /// Matching ignores case, spaces, hyphens and underscores.
    ///
    /// # Errors
    ///
    /// Returns `RequirementError::InvalidCategory` for unknown names
    pub fn parse(value: &str) -> Result<Self, RequirementError> {
        let key: String = value
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "functional" | "business" => Ok(Self::Functional),
            "nonfunctional" | "nfr" | "quality" => Ok(Self::NonFunctional),
            "constraint" | "technical" | "businessconstraint" => Ok(Self::Constraint),
            _ => Err(RequirementError::InvalidCategory {
                value: value.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Functional => "Functional",
            Self::NonFunctional => "Non-functional",
            Self::Constraint => "Constraint",
        }
    }
}

impl FromStr for Category {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a requirement entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementSource {
    Chat,
    Manual,
    Document,
}

impl fmt::Display for RequirementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Manual => write!(f, "manual"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// A validated requirement that has not been assigned an id yet.
///
/// Drafts come from extraction or manual entry; a `RequirementSet` turns them
/// into [`Requirement`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementDraft {
    text: String,
    priority: Priority,
    category: Category,
    source: RequirementSource,
}

impl RequirementDraft {
    /// # Errors
    ///
    /// Returns `RequirementError::EmptyRequirement` when `text` is blank
    pub fn new(
        text: impl AsRef<str>,
        priority: Priority,
        category: Category,
        source: RequirementSource,
    ) -> Result<Self, RequirementError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(RequirementError::EmptyRequirement);
        }
        Ok(Self {
            text: text.to_string(),
            priority,
            category,
            source,
        })
    }

    /// A manually entered requirement; unspecified classification defaults to
    /// Functional / Medium.
    ///
    /// # Errors
    ///
    /// Returns `RequirementError::EmptyRequirement` when `text` is blank
    pub fn manual(
        text: impl AsRef<str>,
        priority: Option<Priority>,
        category: Option<Category>,
    ) -> Result<Self, RequirementError> {
        Self::new(
            text,
            priority.unwrap_or(Priority::Medium),
            category.unwrap_or(Category::Functional),
            RequirementSource::Manual,
        )
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn source(&self) -> RequirementSource {
        self.source
    }

    pub(crate) fn into_requirement(self, id: String) -> Requirement {
        Requirement {
            id,
            text: self.text,
            priority: self.priority,
            category: self.category,
            source: self.source,
        }
    }
}

/// A recorded requirement. Immutable; only a session reset removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    id: String,
    text: String,
    priority: Priority,
    category: Category,
    source: RequirementSource,
}

impl Requirement {
    /// `REQ-001`, `REQ-002`, … in insertion order
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn source(&self) -> RequirementSource {
        self.source
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [Priority: {}, Category: {}]",
            self.id, self.text, self.priority, self.category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_synonyms() {
        for name in ["Non-functional", "nonfunctional", "NFR", "Quality", "non functional"] {
            assert_eq!(Category::parse(name).unwrap(), Category::NonFunctional, "{name}");
        }
        for name in ["Technical", "Constraint", "Business constraint", "business_constraint"] {
            assert_eq!(Category::parse(name).unwrap(), Category::Constraint, "{name}");
        }
        for name in ["Business", "functional"] {
            assert_eq!(Category::parse(name).unwrap(), Category::Functional, "{name}");
        }
        assert!(matches!(
            Category::parse("Cosmetic"),
            Err(RequirementError::InvalidCategory { .. })
        ));
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(Priority::parse(" med ").unwrap(), Priority::Medium);
        assert!(Priority::parse("urgent").is_err());
        assert!(Priority::High > Priority::Low);
    }

    #[test]
    fn test_draft_rejects_blank_text() {
        assert_eq!(
            RequirementDraft::manual("   \n", None, None),
            Err(RequirementError::EmptyRequirement)
        );
    }

    #[test]
    fn test_manual_defaults() {
        let draft = RequirementDraft::manual("  Export reports as PDF ", None, None).unwrap();
        assert_eq!(draft.text(), "Export reports as PDF");
        assert_eq!(draft.priority(), Priority::Medium);
        assert_eq!(draft.category(), Category::Functional);
        assert_eq!(draft.source(), RequirementSource::Manual);
    }
}
