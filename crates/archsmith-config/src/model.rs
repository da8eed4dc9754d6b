use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use archsmith_utils::types::ConfigSource;

/// Providers the factory knows how to construct.
pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini", "anthropic", "simulated"];

/// Prompt template names accepted in `llm.prompt_template`.
pub const PROMPT_TEMPLATES: &[&str] = &["default", "claude-optimized", "openai-compatible"];

/// Fully resolved archsmith configuration.
///
/// Every value is concrete; `source_attribution` records where each dotted key came from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub conversation: ConversationConfig,
    pub documents: DocumentsConfig,
    pub context: ContextConfig,
    pub generation: GenerationConfig,
    pub export: ExportConfig,
    /// Config file that contributed values, if any
    pub config_file: Option<PathBuf>,
    #[serde(skip)]
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[llm]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Primary provider: `gemini`, `anthropic` or `simulated`
    pub provider: String,
    /// Provider tried when the primary cannot be constructed
    pub fallback_provider: Option<String>,
    /// Message shaping template
    pub prompt_template: String,
    /// Maximum model calls per process; unlimited when unset
    pub call_budget: Option<u32>,
    pub gemini: ProviderConfig,
    pub anthropic: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            fallback_provider: None,
            prompt_template: "default".to_string(),
            call_budget: None,
            gemini: ProviderConfig {
                model: "gemini-2.5-flash".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                base_url: None,
            },
            anthropic: ProviderConfig {
                model: "claude-sonnet-4-20250514".to_string(),
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
                base_url: None,
            },
        }
    }
}

impl LlmConfig {
    /// Provider-specific settings by provider name.
    #[must_use]
    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        match provider {
            "gemini" => Some(&self.gemini),
            "anthropic" => Some(&self.anthropic),
            _ => None,
        }
    }
}

/// `[llm.gemini]` / `[llm.anthropic]` sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Override for the provider's API base URL
    pub base_url: Option<String>,
}

/// `[conversation]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationConfig {
    /// Hard cap on user turns before review is forced
    pub max_turns: u32,
    /// Requirements needed before the assistant stops asking clarifying questions
    pub min_requirements: usize,
    /// Categories that must be represented before review, e.g. `non-functional`
    pub required_categories: Vec<String>,
    /// Run requirement extraction after every user turn
    pub extract_every_turn: bool,
    /// Sampling temperature for the interviewer replies
    pub temperature: f32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: 12,
            min_requirements: 3,
            required_categories: vec!["non-functional".to_string()],
            extract_every_turn: true,
            temperature: 0.7,
        }
    }
}

/// `[documents]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentsConfig {
    /// Maximum raw size of an uploaded document
    pub max_bytes: usize,
    /// Ask the model to extract requirements from uploaded documents
    pub extract_requirements: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            extract_requirements: false,
        }
    }
}

/// `[context]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextConfig {
    /// Size budget for requirement and document text in one generation run
    pub max_bytes: usize,
    /// Smallest lead excerpt kept from a truncated document
    pub min_excerpt_bytes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_bytes: 48 * 1024,
            min_excerpt_bytes: 512,
        }
    }
}

/// `[generation]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Attempts per section before the fallback placeholder is used
    pub max_attempts: u32,
    /// Timeout for a single model call
    pub timeout_secs: u64,
    /// Linear backoff unit between attempts
    pub backoff_ms: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 120,
            backoff_ms: 500,
            max_output_tokens: 8192,
            temperature: 0.3,
        }
    }
}

impl GenerationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before attempt `attempt + 1`, growing linearly with `attempt`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// `[export]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    /// Prefix exported documents with notes on viewing Mermaid diagrams
    pub include_viewing_notes: bool,
    /// Output path used when none is given
    pub default_output: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_viewing_notes: true,
            default_output: "solution_architecture.md".to_string(),
        }
    }
}
