//! Requirements + documents → [`ContextBundle`]
//!
//! Size is the UTF-8 byte length of requirement texts plus document texts.
//! Requirements are never cut. When documents do not fit, they are truncated
//! to a common cap (the longest lose the most); if even the minimum excerpts
//! do not fit, the least recently added document is dropped and the cap is
//! recomputed.

use std::sync::Arc;

use archsmith_documents::SupportingDocument;
use archsmith_requirements::Requirement;
use archsmith_utils::error::ContextError;
use archsmith_utils::text::truncate_at_char_boundary;
use tracing::{debug, info};

use crate::budget::{BudgetUsage, ContextBudget};
use crate::bundle::{ContextAssembly, ContextBundle, ContextReport, DocumentExcerpt, Truncation};

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler {
    budget: ContextBudget,
}

impl ContextAssembler {
    #[must_use]
    pub const fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    #[must_use]
    pub const fn budget(&self) -> ContextBudget {
        self.budget
    }

    /// Build a bundle from `requirements` and `documents` (in the order they
    /// were added).
    ///
    /// # Errors
    ///
    /// - `ContextError::Empty` when there are no requirements
    /// - `ContextError::RequirementsOverBudget` when requirement text alone exceeds the budget
    pub fn assemble(
        &self,
        requirements: &[Requirement],
        documents: &[SupportingDocument],
    ) -> Result<ContextAssembly, ContextError> {
        if requirements.is_empty() {
            return Err(ContextError::Empty);
        }

        let required_bytes: usize = requirements.iter().map(|r| r.text().len()).sum();
        if required_bytes > self.budget.max_bytes {
            return Err(ContextError::RequirementsOverBudget {
                required_bytes,
                budget_bytes: self.budget.max_bytes,
            });
        }

        let available = self.budget.max_bytes - required_bytes;
        let mut usage = BudgetUsage::new(self.budget.max_bytes);
        usage.add(required_bytes);

        let mut kept: Vec<&SupportingDocument> = documents.iter().collect();
        let mut report = ContextReport::default();

        let cap = loop {
            let lengths: Vec<usize> = kept.iter().map(|d| d.extracted_text().len()).collect();
            let total: usize = lengths.iter().sum();
            if total <= available {
                break None;
            }
            let minimum = excerpt_total(&lengths, self.budget.min_excerpt_bytes);
            if minimum <= available {
                break Some(water_level(&lengths, available, self.budget.min_excerpt_bytes));
            }
            // Even minimum excerpts overflow; give up the oldest document.
            let dropped = kept.remove(0);
            debug!(
                document_id = dropped.id(),
                label = dropped.label(),
                "Dropping document from generation context"
            );
            report.dropped.push(dropped.id().to_string());
        };

        let mut excerpts = Vec::with_capacity(kept.len());
        for document in kept {
            let full = document.extracted_text();
            let text = match cap {
                Some(cap) => truncate_at_char_boundary(full, cap),
                None => full,
            };
            if text.len() < full.len() {
                report.truncated.push(Truncation {
                    document_id: document.id().to_string(),
                    original_bytes: full.len(),
                    kept_bytes: text.len(),
                });
            }
            usage.add(text.len());
            excerpts.push(DocumentExcerpt::new(document, text));
        }

        info!(
            requirements = requirements.len(),
            documents = excerpts.len(),
            bytes_used = usage.bytes_used,
            max_bytes = usage.max_bytes,
            truncated = report.truncated.len(),
            dropped = report.dropped.len(),
            "Assembled generation context"
        );

        let bundle = ContextBundle::new(requirements.to_vec(), excerpts, usage, report.clone());
        Ok(ContextAssembly {
            bundle: Arc::new(bundle),
            report,
        })
    }
}

/// Σ min(len, cap)
fn excerpt_total(lengths: &[usize], cap: usize) -> usize {
    lengths.iter().map(|&len| len.min(cap)).sum()
}

/// Highest cap in `[floor, max(lengths)]` whose excerpt total fits in `available`.
///
/// Callers guarantee `excerpt_total(lengths, floor) <= available`.
fn water_level(lengths: &[usize], available: usize, floor: usize) -> usize {
    let mut lo = floor;
    let mut hi = lengths.iter().copied().max().unwrap_or(floor).max(floor);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if excerpt_total(lengths, mid) <= available {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}
