//! Error taxonomy for archsmith.
//!
//! Library crates return the leaf enums defined here; [`ArchsmithError`] collects them for
//! the facade and CLI. Every leaf implements [`UserFriendlyError`] so the CLI can print a
//! message, some context and actionable suggestions.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Top-level error type for archsmith operations.
///
/// Library code returns `ArchsmithError` (or a leaf enum) and never calls
/// `std::process::exit()`. The CLI maps it with [`to_exit_code`](Self::to_exit_code).
#[derive(Error, Debug)]
pub enum ArchsmithError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Requirement error: {0}")]
    Requirement(#[from] RequirementError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchsmithError {
    /// Map this error onto the CLI exit code table.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Document(_) | Self::Requirement(_) => ExitCode::INPUT_REJECTED,
            Self::Context(_) => ExitCode::CONTEXT_UNAVAILABLE,
            Self::Session(SessionError::EmptyContext) => ExitCode::CONTEXT_UNAVAILABLE,
            Self::Session(SessionError::InvalidTransition { .. }) => ExitCode::CLI_ARGS,
            Self::Session(_) => ExitCode::INTERNAL,
            Self::Llm(LlmError::Timeout { .. }) => ExitCode::GENERATION_TIMEOUT,
            Self::Llm(LlmError::Misconfiguration(_) | LlmError::Unsupported(_)) => {
                ExitCode::CLI_ARGS
            }
            Self::Llm(_) => ExitCode::LLM_FAILURE,
            Self::Export(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }

    /// Render the error with context and suggestions for terminal output.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut out = format!("Error ({}): {}", self.category(), self.user_message());
        if let Some(context) = self.context() {
            out.push_str("\n\n");
            out.push_str(&context);
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                out.push_str("\n  - ");
                out.push_str(&suggestion);
            }
        }
        out
    }

    fn as_friendly(&self) -> Option<&dyn UserFriendlyError> {
        match self {
            Self::Config(e) => Some(e),
            Self::Document(e) => Some(e),
            Self::Requirement(e) => Some(e),
            Self::Context(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::Llm(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io(_) => None,
        }
    }
}

impl UserFriendlyError for ArchsmithError {
    fn user_message(&self) -> String {
        match self.as_friendly() {
            Some(inner) => inner.user_message(),
            None => self.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        self.as_friendly().and_then(UserFriendlyError::context)
    }

    fn suggestions(&self) -> Vec<String> {
        match self.as_friendly() {
            Some(inner) => inner.suggestions(),
            None => vec!["Check file permissions and available disk space".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self.as_friendly() {
            Some(inner) => inner.category(),
            None => ErrorCategory::FileSystem,
        }
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Conversation,
    Generation,
    ModelIntegration,
    FileSystem,
    ResourceLimits,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Input => write!(f, "Input"),
            Self::Conversation => write!(f, "Conversation"),
            Self::Generation => write!(f, "Generation"),
            Self::ModelIntegration => write!(f, "Model Integration"),
            Self::FileSystem => write!(f, "File System"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("Configuration validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
            Self::ValidationFailed { errors, .. } => format!(
                "Configuration validation failed with {} errors: {}",
                errors.len(),
                errors.join(", ")
            ),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [llm], [conversation], [documents], [context], [generation] and [export] tables.".to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific range or format requirements."
            )),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "archsmith searches for .archsmith/config.toml starting from the current directory upward, after checking ARCHSMITH_HOME.".to_string(),
            ),
            Self::ValidationFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Run 'archsmith config' to see the effective configuration".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "llm.provider" | "llm.fallback_provider" => vec![
                    "Use one of 'gemini', 'anthropic' or 'simulated'".to_string(),
                    "Override with ARCHSMITH_LLM_PROVIDER or --provider".to_string(),
                ],
                "generation.max_attempts" => {
                    vec!["Use an integer between 1 and 10".to_string()]
                }
                "conversation.max_turns" => {
                    vec!["Use an integer between 1 and 100".to_string()]
                }
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .archsmith/config.toml in your project root".to_string(),
                "Omit --config to use built-in defaults".to_string(),
            ],
            Self::DiscoveryFailed { .. } => vec![
                "Check read permissions on the current directory and its parents".to_string(),
            ],
            Self::ValidationFailed { .. } => vec![
                "Fix each listed value and run 'archsmith config' again".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised while turning an uploaded document into plain text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Unsupported document format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Document '{label}' could not be read: {reason}")]
    Corrupt { label: String, reason: String },

    #[error("Document '{label}' is password protected")]
    PasswordProtected { label: String },

    #[error("Document '{label}' is {size_bytes} bytes, limit is {max_bytes} bytes")]
    TooLarge {
        label: String,
        size_bytes: usize,
        max_bytes: usize,
    },
}

impl UserFriendlyError for DocumentError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::UnsupportedFormat { .. } => {
                Some("Supported formats are PDF, DOCX, TXT and Markdown.".to_string())
            }
            Self::TooLarge { .. } => Some(
                "Documents are size-checked before any text extraction takes place.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnsupportedFormat { .. } => vec![
                "Convert the document to PDF, DOCX, TXT or Markdown".to_string(),
                "Pass an explicit format with --format".to_string(),
            ],
            Self::Corrupt { .. } => vec![
                "Open the file locally to confirm it is not damaged".to_string(),
                "Export the content to plain text and upload that instead".to_string(),
            ],
            Self::PasswordProtected { .. } => {
                vec!["Remove the password and upload the document again".to_string()]
            }
            Self::TooLarge { .. } => vec![
                "Split the document into smaller files".to_string(),
                "Raise documents.max_bytes in .archsmith/config.toml".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::TooLarge { .. } => ErrorCategory::ResourceLimits,
            _ => ErrorCategory::Input,
        }
    }
}

/// Errors raised while recording or parsing requirements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("Requirement text must not be empty")]
    EmptyRequirement,

    #[error("Unknown priority '{value}'")]
    InvalidPriority { value: String },

    #[error("Unknown category '{value}'")]
    InvalidCategory { value: String },
}

impl UserFriendlyError for RequirementError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyRequirement => vec!["Provide a short sentence describing the need".to_string()],
            Self::InvalidPriority { .. } => vec!["Use High, Medium or Low".to_string()],
            Self::InvalidCategory { .. } => {
                vec!["Use Functional, Non-functional or Constraint".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Input
    }
}

/// Errors raised while assembling the size-bounded context bundle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("No requirements recorded; cannot build a generation context")]
    Empty,

    #[error(
        "Requirements alone need {required_bytes} bytes, context budget is {budget_bytes} bytes"
    )]
    RequirementsOverBudget {
        required_bytes: usize,
        budget_bytes: usize,
    },
}

impl UserFriendlyError for ContextError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Empty => Some(
                "Architecture generation needs at least one recorded requirement.".to_string(),
            ),
            Self::RequirementsOverBudget { .. } => Some(
                "Requirements are never truncated, so they must fit the context budget on their own."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Empty => vec![
                "Describe the system in chat or add requirements with /add".to_string(),
            ],
            Self::RequirementsOverBudget { .. } => vec![
                "Raise context.max_bytes in .archsmith/config.toml".to_string(),
                "Merge or shorten overlapping requirements".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::ResourceLimits
    }
}

/// Errors raised by the session lifecycle and its state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session '{session_id}' not found")]
    NotFound { session_id: String },

    #[error("Event '{event}' is not allowed in phase {phase}")]
    InvalidTransition { phase: String, event: String },

    #[error("No requirements recorded; add at least one requirement before generating")]
    EmptyContext,

    #[error("Session is in phase {phase}; the document is not available yet")]
    NotAssemblable { phase: String },
}

impl UserFriendlyError for SessionError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidTransition { .. } => Some(
                "Sessions move Idle, Gathering, Reviewing, Generating, then Complete or Failed."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec!["Start a new session".to_string()],
            Self::InvalidTransition { .. } => {
                vec!["Use /review to see what the session is waiting for".to_string()]
            }
            Self::EmptyContext => {
                vec!["Add a requirement with /add or describe the system in chat".to_string()]
            }
            Self::NotAssemblable { .. } => {
                vec!["Run /generate and wait for it to finish".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Conversation
    }
}

/// Errors that can occur during LLM backend operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl LlmError {
    /// Whether a failed call may be attempted again within the retry budget.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ProviderQuota(_) | Self::ProviderOutage(_) | Self::Timeout { .. }
        )
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::BudgetExceeded { limit, attempted } => {
                format!("LLM budget exceeded: attempted {attempted} calls, limit is {limit}")
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("Transport errors occur when the model service cannot be reached.".to_string())
            }
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when a model call takes longer than generation.timeout_secs."
                    .to_string(),
            ),
            Self::BudgetExceeded { .. } => {
                Some("llm.call_budget caps the number of model calls per process.".to_string())
            }
            Self::Misconfiguration(_) | Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Verify network connectivity".to_string(),
                "Try running with --verbose to see detailed error information".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the API key environment variable is set (GEMINI_API_KEY or ANTHROPIC_API_KEY)".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Configure llm.fallback_provider".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase generation.timeout_secs".to_string(),
                "Check your internet connection".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Raise llm.call_budget or remove it".to_string(),
            ],
            Self::Misconfiguration(_) => vec![
                "Run 'archsmith config' to inspect the [llm] settings".to_string(),
                "Use --dry-run to try the pipeline with the simulated backend".to_string(),
            ],
            Self::Unsupported(_) => {
                vec!["Use one of 'gemini', 'anthropic' or 'simulated'".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::BudgetExceeded { .. } => ErrorCategory::ResourceLimits,
            Self::Misconfiguration(_) | Self::Unsupported(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::ModelIntegration,
        }
    }
}

/// Errors raised when writing the final document to a destination.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write '{destination}': {reason}")]
    Write { destination: String, reason: String },

    #[error("Invalid export destination '{destination}'")]
    InvalidDestination { destination: String },
}

impl UserFriendlyError for ExportError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Write { .. } => vec![
                "Check that the target directory is writable".to_string(),
                "Choose a different path with --out".to_string(),
            ],
            Self::InvalidDestination { .. } => {
                vec!["Provide a file path such as architecture.md".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_for_error_families() {
        let err = ArchsmithError::from(ConfigError::InvalidFile("bad".to_string()));
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);

        let err = ArchsmithError::from(DocumentError::TooLarge {
            label: "big.pdf".to_string(),
            size_bytes: 15,
            max_bytes: 10,
        });
        assert_eq!(err.to_exit_code(), ExitCode::INPUT_REJECTED);

        let err = ArchsmithError::from(SessionError::EmptyContext);
        assert_eq!(err.to_exit_code(), ExitCode::CONTEXT_UNAVAILABLE);

        let err = ArchsmithError::from(LlmError::Timeout {
            duration: Duration::from_secs(5),
        });
        assert_eq!(err.to_exit_code(), ExitCode::GENERATION_TIMEOUT);

        let err = ArchsmithError::from(LlmError::ProviderAuth("401".to_string()));
        assert_eq!(err.to_exit_code(), ExitCode::LLM_FAILURE);
    }

    #[test]
    fn test_retryable_llm_errors() {
        assert!(LlmError::Transport("reset".to_string()).is_retryable());
        assert!(LlmError::ProviderOutage("503".to_string()).is_retryable());
        assert!(LlmError::ProviderQuota("429".to_string()).is_retryable());
        assert!(LlmError::Timeout { duration: Duration::from_secs(1) }.is_retryable());

        assert!(!LlmError::ProviderAuth("401".to_string()).is_retryable());
        assert!(!LlmError::Misconfiguration("no key".to_string()).is_retryable());
        assert!(!LlmError::Unsupported("x".to_string()).is_retryable());
        assert!(!LlmError::BudgetExceeded { limit: 1, attempted: 2 }.is_retryable());
    }

    #[test]
    fn test_empty_context_names_precondition() {
        let err = ArchsmithError::from(SessionError::EmptyContext);
        let rendered = err.display_for_user();
        assert!(rendered.contains("No requirements recorded"));
        assert!(rendered.contains("Suggestions:"));
        assert_eq!(err.category(), ErrorCategory::Conversation);
    }

    #[test]
    fn test_document_too_large_is_resource_limit() {
        let err = DocumentError::TooLarge {
            label: "spec.pdf".to_string(),
            size_bytes: 15 * 1024 * 1024,
            max_bytes: 10 * 1024 * 1024,
        };
        assert_eq!(err.category(), ErrorCategory::ResourceLimits);
        assert!(err.user_message().contains("spec.pdf"));
    }
}
