use std::collections::HashSet;

use archsmith_utils::text::dedup_key;
use serde::Serialize;
use tracing::debug;

use crate::model::{Category, Requirement, RequirementDraft};

/// Ordered, deduplicated requirements of one session.
///
/// Texts are unique under [`dedup_key`]; the first occurrence wins and later
/// duplicates are dropped without error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequirementSet {
    items: Vec<Requirement>,
    #[serde(skip)]
    keys: HashSet<String>,
    #[serde(skip)]
    next_seq: u32,
}

impl RequirementSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one draft. Returns the recorded requirement, or `None` for a duplicate.
    pub fn add(&mut self, draft: RequirementDraft) -> Option<&Requirement> {
        let key = dedup_key(draft.text());
        if !self.keys.insert(key) {
            debug!(text = draft.text(), "Dropping duplicate requirement");
            return None;
        }
        self.next_seq += 1;
        let id = format!("REQ-{:03}", self.next_seq);
        self.items.push(draft.into_requirement(id));
        self.items.last()
    }

    /// Add drafts in order, returning the ones actually recorded.
    pub fn extend(&mut self, drafts: impl IntoIterator<Item = RequirementDraft>) -> Vec<Requirement> {
        drafts
            .into_iter()
            .filter_map(|draft| self.add(draft).cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Requirement] {
        &self.items
    }

    #[must_use]
    pub fn has_category(&self, category: Category) -> bool {
        self.items.iter().any(|r| r.category() == category)
    }

    /// Remove everything and restart numbering at `REQ-001`.
    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
        self.next_seq = 0;
    }
}

impl<'a> IntoIterator for &'a RequirementSet {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
