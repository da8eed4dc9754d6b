//! Core types for the model backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use archsmith_utils::error::LlmError;

/// Task label for interviewer replies during requirement gathering.
pub const TASK_CHAT: &str = "chat";

/// Task label for requirement extraction over a transcript or document.
pub const TASK_EXTRACT: &str = "extract-requirements";

/// Line prefix in a chat system prompt naming what the next question should cover.
pub const FOCUS_HINT_PREFIX: &str = "Focus your next question on:";

/// Chat system prompt line telling the interviewer the user may move on to review.
pub const READY_HINT: &str =
    "You have enough to draft; tell the user they can review now or keep adding detail.";

const SECTION_TASK_PREFIX: &str = "section:";

/// Task label for generating one architecture section, e.g. `section:trade-offs`.
#[must_use]
pub fn section_task(slug: &str) -> String {
    format!("{SECTION_TASK_PREFIX}{slug}")
}

/// Section slug carried by a `section:<slug>` task label.
#[must_use]
pub fn section_slug(task: &str) -> Option<&str> {
    task.strip_prefix(SECTION_TASK_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One request to a model backend.
///
/// `model` may be empty, in which case the backend uses its configured default.
/// Sampling hints travel in `metadata` under `max_tokens` and `temperature`.
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    pub session_id: String,
    /// `chat`, `extract-requirements` or `section:<slug>`
    pub task: String,
    pub model: String,
    pub timeout: Duration,
    pub messages: Vec<Message>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        task: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            task: task.into(),
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        self.with_metadata("max_tokens", serde_json::json!(max_tokens))
    }

    #[must_use]
    pub fn with_temperature(self, temperature: f32) -> Self {
        self.with_metadata("temperature", serde_json::json!(temperature))
    }

    pub(crate) fn max_tokens_hint(&self) -> Option<u32> {
        self.metadata
            .get("max_tokens")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn temperature_hint(&self) -> Option<f32> {
        self.metadata
            .get("temperature")
            .and_then(serde_json::Value::as_f64)
            .map(|v| v as f32)
    }

    /// Concatenated text of all messages with the given role.
    #[must_use]
    pub fn text_for(&self, role: Role) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == role)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub extensions: HashMap<String, serde_json::Value>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            extensions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Trait for model backend implementations
///
/// HTTP providers, the offline simulated provider and test doubles all implement
/// this trait, so the engine never needs to know which one it is talking to.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the model with the given invocation parameters
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for any failure during invocation: transport failures,
    /// provider errors (auth, quota, outages), timeouts and budget exhaustion.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}

/// Recorded when the primary provider could not be constructed and the
/// fallback provider was used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmFallbackInfo {
    pub primary_provider: String,
    pub fallback_provider: String,
    pub reason: String,
}
