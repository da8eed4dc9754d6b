use archsmith_sections::SectionName;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Pending,
    Valid,
    FailedFallback,
}

impl SectionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::FailedFallback => "failed_fallback",
        }
    }

    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Why one generation attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub attempt: u32,
    pub reasons: Vec<String>,
}

/// Outcome of generating one section.
///
/// A pending result is resolved exactly once; the resolving methods consume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionResult {
    name: SectionName,
    status: SectionStatus,
    content: String,
    attempt_count: u32,
    failures: Vec<AttemptFailure>,
}

impl SectionResult {
    #[must_use]
    pub fn pending(name: SectionName) -> Self {
        Self {
            name,
            status: SectionStatus::Pending,
            content: String::new(),
            attempt_count: 0,
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub(crate) fn into_valid(
        self,
        content: String,
        attempt_count: u32,
        failures: Vec<AttemptFailure>,
    ) -> Self {
        self.resolve(SectionStatus::Valid, content, attempt_count, failures)
    }

    #[must_use]
    pub(crate) fn into_fallback(
        self,
        placeholder: String,
        attempt_count: u32,
        failures: Vec<AttemptFailure>,
    ) -> Self {
        self.resolve(SectionStatus::FailedFallback, placeholder, attempt_count, failures)
    }

    fn resolve(
        self,
        status: SectionStatus,
        content: String,
        attempt_count: u32,
        failures: Vec<AttemptFailure>,
    ) -> Self {
        debug_assert_eq!(self.status, SectionStatus::Pending);
        Self {
            name: self.name,
            status,
            content,
            attempt_count,
            failures,
        }
    }

    #[must_use]
    pub fn name(&self) -> SectionName {
        self.name
    }

    #[must_use]
    pub fn status(&self) -> SectionStatus {
        self.status
    }

    /// Validated section Markdown, or the placeholder for a failed section.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub fn failures(&self) -> &[AttemptFailure] {
        &self.failures
    }
}
