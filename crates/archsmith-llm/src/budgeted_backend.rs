//! Call-budget wrapper for any backend
//!
//! Caps the total number of model calls made through one backend instance.
//! The counter is incremented before the inner call, so failed calls still
//! consume budget.

use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use archsmith_utils::error::LlmError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedBackend {
    #[must_use]
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Calls attempted so far, including rejected ones.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(
                limit = self.limit,
                attempted,
                task = %inv.task,
                "Model call budget exceeded"
            );
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        debug!(
            call_count = current + 1,
            limit = self.limit,
            task = %inv.task,
            "Budget check passed, invoking inner backend"
        );

        let result = self.inner.invoke(inv).await;
        if let Err(e) = &result {
            debug!(
                call_count = current + 1,
                error = %e,
                "Inner backend failed (budget slot still consumed)"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use std::sync::Arc;
    use std::time::Duration;

    struct AlwaysOk;

    #[async_trait]
    impl LlmBackend for AlwaysOk {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new("ok", "mock", "mock-model"))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl LlmBackend for AlwaysFails {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::Transport("mock failure".to_string()))
        }
    }

    fn invocation() -> LlmInvocation {
        LlmInvocation::new(
            "session",
            "chat",
            "",
            Duration::from_secs(5),
            vec![Message::user("hello")],
        )
    }

    #[tokio::test]
    async fn test_allows_calls_up_to_limit() {
        let backend = BudgetedBackend::new(Box::new(AlwaysOk), 2);
        assert!(backend.invoke(invocation()).await.is_ok());
        assert!(backend.invoke(invocation()).await.is_ok());
        assert_eq!(backend.call_count(), 2);

        let err = backend.invoke(invocation()).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::BudgetExceeded {
                limit: 2,
                attempted: 3
            }
        );
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_calls_consume_budget() {
        let backend = BudgetedBackend::new(Box::new(AlwaysFails), 1);
        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::Transport(_))
        ));
        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::BudgetExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_limit_rejects_everything() {
        let backend = BudgetedBackend::new(Box::new(AlwaysOk), 0);
        assert!(backend.invoke(invocation()).await.is_err());
        assert_eq!(backend.limit(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_never_exceed_limit() {
        let backend = Arc::new(BudgetedBackend::new(Box::new(AlwaysOk), 5));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move { backend.invoke(invocation()).await }));
        }
        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 5);
        assert_eq!(backend.call_count(), 20);
    }
}
