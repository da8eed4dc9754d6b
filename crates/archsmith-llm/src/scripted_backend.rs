//! Scripted backend for tests
//!
//! Replies are queued per task prefix and consumed in order. When no queued
//! reply matches, the call is answered by [`SimulatedBackend`], so a test only
//! scripts the calls it cares about.

use crate::simulated_backend::SimulatedBackend;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use archsmith_utils::error::LlmError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Error(LlmError),
    /// Sleep before answering; used to trip caller-side timeouts
    Delayed(Duration, String),
}

impl ScriptedReply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    rules: Mutex<Vec<(String, VecDeque<ScriptedReply>)>>,
    invocations: Mutex<Vec<LlmInvocation>>,
    fallback: SimulatedBackend,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` for the next call whose task starts with `task_prefix`.
    #[must_use]
    pub fn with_reply(self, task_prefix: impl Into<String>, reply: ScriptedReply) -> Self {
        self.push(task_prefix, reply);
        self
    }

    pub fn push(&self, task_prefix: impl Into<String>, reply: ScriptedReply) {
        let task_prefix = task_prefix.into();
        let mut rules = lock(&self.rules);
        match rules.iter_mut().find(|(prefix, _)| *prefix == task_prefix) {
            Some((_, queue)) => queue.push_back(reply),
            None => rules.push((task_prefix, VecDeque::from([reply]))),
        }
    }

    /// Every invocation received so far, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        lock(&self.invocations).clone()
    }

    /// Number of calls whose task starts with `task_prefix`.
    #[must_use]
    pub fn calls_for(&self, task_prefix: &str) -> usize {
        lock(&self.invocations)
            .iter()
            .filter(|inv| inv.task.starts_with(task_prefix))
            .count()
    }

    fn next_reply(&self, task: &str) -> Option<ScriptedReply> {
        let mut rules = lock(&self.rules);
        rules
            .iter_mut()
            .filter(|(prefix, queue)| task.starts_with(prefix.as_str()) && !queue.is_empty())
            .max_by_key(|(prefix, _)| prefix.len())
            .and_then(|(_, queue)| queue.pop_front())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        lock(&self.invocations).push(inv.clone());

        match self.next_reply(&inv.task) {
            Some(ScriptedReply::Text(text)) => Ok(LlmResult::new(text, "scripted", "scripted")),
            Some(ScriptedReply::Error(err)) => Err(err),
            Some(ScriptedReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(LlmResult::new(text, "scripted", "scripted"))
            }
            None => self.fallback.invoke(inv).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TASK_CHAT, section_task};

    fn invocation(task: &str) -> LlmInvocation {
        LlmInvocation::new("s", task, "", Duration::from_secs(5), vec![])
    }

    #[tokio::test]
    async fn test_replies_consumed_in_order_then_fallback() {
        let backend = ScriptedBackend::new()
            .with_reply("section:trade-offs", ScriptedReply::text("first"))
            .with_reply(
                "section:trade-offs",
                ScriptedReply::Error(LlmError::ProviderOutage("503".to_string())),
            );

        let task = section_task("trade-offs");
        assert_eq!(
            backend.invoke(invocation(&task)).await.unwrap().raw_response,
            "first"
        );
        assert!(backend.invoke(invocation(&task)).await.is_err());
        let third = backend.invoke(invocation(&task)).await.unwrap();
        assert_eq!(third.provider, "simulated");
        assert_eq!(backend.calls_for("section:"), 3);
    }

    #[tokio::test]
    async fn test_longest_matching_prefix_wins() {
        let backend = ScriptedBackend::new()
            .with_reply("section:", ScriptedReply::text("generic"))
            .with_reply("section:system-components", ScriptedReply::text("specific"));
        let reply = backend
            .invoke(invocation(&section_task("system-components")))
            .await
            .unwrap();
        assert_eq!(reply.raw_response, "specific");
    }

    #[tokio::test]
    async fn test_records_invocations() {
        let backend = ScriptedBackend::new();
        backend.invoke(invocation(TASK_CHAT)).await.unwrap();
        let seen = backend.invocations();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].task, TASK_CHAT);
    }
}
