use archsmith_utils::error::ConfigError;

use super::{Config, PROMPT_TEMPLATES, SUPPORTED_PROVIDERS};

const MAX_DOCUMENT_BYTES: usize = 100 * 1024 * 1024;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(invalid(
                "llm.provider",
                format!(
                    "unknown provider '{}' (expected one of: {})",
                    self.llm.provider,
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            ));
        }

        if let Some(fallback) = &self.llm.fallback_provider {
            if !SUPPORTED_PROVIDERS.contains(&fallback.as_str()) {
                return Err(invalid(
                    "llm.fallback_provider",
                    format!("unknown provider '{fallback}'"),
                ));
            }
            if *fallback == self.llm.provider {
                return Err(invalid(
                    "llm.fallback_provider",
                    "must differ from llm.provider",
                ));
            }
        }

        if !PROMPT_TEMPLATES.contains(&self.llm.prompt_template.as_str()) {
            return Err(invalid(
                "llm.prompt_template",
                format!(
                    "unknown template '{}' (expected one of: {})",
                    self.llm.prompt_template,
                    PROMPT_TEMPLATES.join(", ")
                ),
            ));
        }

        if self.llm.call_budget == Some(0) {
            return Err(invalid("llm.call_budget", "must be greater than 0"));
        }

        for (name, provider) in [("gemini", &self.llm.gemini), ("anthropic", &self.llm.anthropic)] {
            if provider.model.trim().is_empty() {
                return Err(invalid(&format!("llm.{name}.model"), "must not be empty"));
            }
            if provider.api_key_env.trim().is_empty() {
                return Err(invalid(
                    &format!("llm.{name}.api_key_env"),
                    "must not be empty",
                ));
            }
        }

        let conversation = &self.conversation;
        if !(1..=100).contains(&conversation.max_turns) {
            return Err(invalid(
                "conversation.max_turns",
                format!("{} is outside 1..=100", conversation.max_turns),
            ));
        }
        if conversation.min_requirements > 50 {
            return Err(invalid(
                "conversation.min_requirements",
                "exceeds maximum limit of 50",
            ));
        }
        for category in &conversation.required_categories {
            let normalized = category.to_ascii_lowercase().replace(['-', '_', ' '], "");
            if !matches!(normalized.as_str(), "functional" | "nonfunctional" | "constraint") {
                return Err(invalid(
                    "conversation.required_categories",
                    format!("unknown category '{category}'"),
                ));
            }
        }
        if !(0.0..=2.0).contains(&conversation.temperature) {
            return Err(invalid("conversation.temperature", "must be within 0.0..=2.0"));
        }

        if self.documents.max_bytes == 0 {
            return Err(invalid("documents.max_bytes", "must be greater than 0"));
        }
        if self.documents.max_bytes > MAX_DOCUMENT_BYTES {
            return Err(invalid(
                "documents.max_bytes",
                "exceeds maximum limit of 100 MiB",
            ));
        }

        if self.context.max_bytes < 1024 {
            return Err(invalid(
                "context.max_bytes",
                "must be at least 1024 bytes (1 KiB)",
            ));
        }
        if self.context.min_excerpt_bytes == 0
            || self.context.min_excerpt_bytes > self.context.max_bytes
        {
            return Err(invalid(
                "context.min_excerpt_bytes",
                "must be greater than 0 and not exceed context.max_bytes",
            ));
        }

        let generation = &self.generation;
        if !(1..=10).contains(&generation.max_attempts) {
            return Err(invalid(
                "generation.max_attempts",
                format!("{} is outside 1..=10", generation.max_attempts),
            ));
        }
        if !(1..=3600).contains(&generation.timeout_secs) {
            return Err(invalid(
                "generation.timeout_secs",
                "must be between 1 and 3600 seconds",
            ));
        }
        if generation.backoff_ms > 60_000 {
            return Err(invalid(
                "generation.backoff_ms",
                "exceeds maximum limit of 60000 ms",
            ));
        }
        if generation.max_output_tokens == 0 {
            return Err(invalid(
                "generation.max_output_tokens",
                "must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(invalid("generation.temperature", "must be within 0.0..=2.0"));
        }

        if self.export.default_output.trim().is_empty() {
            return Err(invalid("export.default_output", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(err: ConfigError) -> String {
        match err {
            ConfigError::InvalidValue { key, .. } => key,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_range_checks() {
        let mut config = Config::default();
        config.generation.max_attempts = 0;
        assert_eq!(key_of(config.validate().unwrap_err()), "generation.max_attempts");

        let mut config = Config::default();
        config.generation.max_attempts = 11;
        assert_eq!(key_of(config.validate().unwrap_err()), "generation.max_attempts");

        let mut config = Config::default();
        config.conversation.max_turns = 101;
        assert_eq!(key_of(config.validate().unwrap_err()), "conversation.max_turns");

        let mut config = Config::default();
        config.documents.max_bytes = 101 * 1024 * 1024;
        assert_eq!(key_of(config.validate().unwrap_err()), "documents.max_bytes");

        let mut config = Config::default();
        config.context.min_excerpt_bytes = config.context.max_bytes + 1;
        assert_eq!(key_of(config.validate().unwrap_err()), "context.min_excerpt_bytes");
    }

    #[test]
    fn test_provider_checks() {
        let mut config = Config::default();
        config.llm.provider = "openrouter".to_string();
        assert_eq!(key_of(config.validate().unwrap_err()), "llm.provider");

        let mut config = Config::default();
        config.llm.fallback_provider = Some("gemini".to_string());
        assert_eq!(key_of(config.validate().unwrap_err()), "llm.fallback_provider");

        let mut config = Config::default();
        config.llm.prompt_template = "fancy".to_string();
        assert_eq!(key_of(config.validate().unwrap_err()), "llm.prompt_template");
    }

    #[test]
    fn test_required_category_spellings() {
        let mut config = Config::default();
        config.conversation.required_categories =
            vec!["Non-functional".to_string(), "constraint".to_string()];
        assert!(config.validate().is_ok());

        config.conversation.required_categories = vec!["business".to_string()];
        assert_eq!(
            key_of(config.validate().unwrap_err()),
            "conversation.required_categories"
        );
    }
}
