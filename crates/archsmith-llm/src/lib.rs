//! Model backend abstraction for archsmith
//!
//! Every provider implements [`LlmBackend`], so the conversation engine and the
//! section generator never know which one they are talking to. Hosted providers
//! (`gemini`, `anthropic`) share one HTTP client policy; `simulated` answers
//! deterministically without network access.

mod anthropic_backend;
mod budgeted_backend;
mod gemini_backend;
mod http_client;
mod simulated_backend;
mod template;
mod types;

#[cfg(any(test, feature = "test-utils"))]
mod scripted_backend;

pub use budgeted_backend::BudgetedBackend;
pub use simulated_backend::SimulatedBackend;
pub use template::PromptTemplate;
pub use types::{
    FOCUS_HINT_PREFIX, LlmBackend, LlmFallbackInfo, LlmInvocation, LlmResult, Message,
    READY_HINT, Role, TASK_CHAT, TASK_EXTRACT, section_slug, section_task,
};
pub use archsmith_utils::error::LlmError;

#[cfg(any(test, feature = "test-utils"))]
pub use scripted_backend::{ScriptedBackend, ScriptedReply};

use anthropic_backend::AnthropicBackend;
use archsmith_config::Config;
use archsmith_utils::logging::redact_error_message;
use gemini_backend::GeminiBackend;
use tracing::{info, warn};

fn construct_backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    match provider {
        "gemini" => Ok(Box::new(GeminiBackend::from_config(config)?)),
        "anthropic" => Ok(Box::new(AnthropicBackend::from_config(config)?)),
        "simulated" => Ok(Box::new(SimulatedBackend::new())),
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: gemini, anthropic, simulated."
        ))),
    }
}

/// Construct the configured backend, trying `llm.fallback_provider` when the
/// primary cannot be constructed.
///
/// The returned backend is wrapped in a [`BudgetedBackend`] when
/// `llm.call_budget` is set.
///
/// # Errors
///
/// Returns the primary provider's error when neither provider can be built:
/// `LlmError::Misconfiguration` for a missing API key, `LlmError::Unsupported`
/// for an unknown provider name.
pub fn from_config_with_fallback(
    config: &Config,
) -> Result<(Box<dyn LlmBackend>, Option<LlmFallbackInfo>), LlmError> {
    let provider = config.llm.provider.as_str();

    let (backend, fallback_info) = match construct_backend_for_provider(provider, config) {
        Ok(backend) => (backend, None),
        Err(primary_error) => {
            let Some(fallback_provider) = config.llm.fallback_provider.as_deref() else {
                return Err(primary_error);
            };
            let reason = redact_error_message(&primary_error.to_string());
            warn!(
                provider,
                fallback_provider,
                reason = %reason,
                "Primary provider failed during construction, attempting fallback"
            );

            match construct_backend_for_provider(fallback_provider, config) {
                Ok(backend) => (
                    backend,
                    Some(LlmFallbackInfo {
                        primary_provider: provider.to_string(),
                        fallback_provider: fallback_provider.to_string(),
                        reason,
                    }),
                ),
                Err(fallback_error) => {
                    warn!(
                        fallback_provider,
                        error = %redact_error_message(&fallback_error.to_string()),
                        "Fallback provider also failed"
                    );
                    return Err(primary_error);
                }
            }
        }
    };

    let backend = match config.llm.call_budget {
        Some(limit) => {
            info!(limit, "Model call budget enabled");
            Box::new(BudgetedBackend::new(backend, limit)) as Box<dyn LlmBackend>
        }
        None => backend,
    };

    Ok((backend, fallback_info))
}

/// The configured prompt template.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` for an unknown template name
pub fn prompt_template(config: &Config) -> Result<PromptTemplate, LlmError> {
    PromptTemplate::parse(&config.llm.prompt_template).map_err(LlmError::Misconfiguration)
}
