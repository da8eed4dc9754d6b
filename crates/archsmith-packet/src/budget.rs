use archsmith_config::ContextConfig;
use serde::Serialize;

/// Limits for one generation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextBudget {
    /// Requirement text plus document text, in UTF-8 bytes
    pub max_bytes: usize,
    /// Smallest lead excerpt a document is cut down to before it is dropped
    pub min_excerpt_bytes: usize,
}

impl ContextBudget {
    #[must_use]
    pub const fn new(max_bytes: usize, min_excerpt_bytes: usize) -> Self {
        Self {
            max_bytes,
            min_excerpt_bytes,
        }
    }

    #[must_use]
    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.max_bytes, config.min_excerpt_bytes)
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetUsage {
    pub bytes_used: usize,
    pub max_bytes: usize,
}

impl BudgetUsage {
    #[must_use]
    pub const fn new(max_bytes: usize) -> Self {
        Self {
            bytes_used: 0,
            max_bytes,
        }
    }

    pub const fn add(&mut self, bytes: usize) {
        self.bytes_used += bytes;
    }

    /// Bytes still available under the budget.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.max_bytes.saturating_sub(self.bytes_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_tracking() {
        let mut usage = BudgetUsage::new(1000);
        assert_eq!(usage.remaining(), 1000);
        usage.add(600);
        assert_eq!(usage.remaining(), 400);
        usage.add(500);
        assert_eq!(usage.bytes_used, 1100);
        assert_eq!(usage.remaining(), 0);
    }

    #[test]
    fn test_budget_from_config() {
        let budget = ContextBudget::default();
        assert_eq!(budget.max_bytes, 48 * 1024);
        assert_eq!(budget.min_excerpt_bytes, 512);
    }
}
