use archsmith_utils::error::ConfigError;

use super::{Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// ```rust
    /// use archsmith_config::Config;
    ///
    /// let config = Config::builder()
    ///     .provider("simulated")
    ///     .max_attempts(2)
    ///     .context_max_bytes(8 * 1024)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.generation.max_attempts, 2);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for programmatic configuration.
///
/// Starts from built-in defaults, never reads files or the environment, and attributes
/// every value it sets to [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    fn set(mut self, key: &str, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self.config
            .source_attribution
            .insert(key.to_string(), ConfigSource::Programmatic);
        self
    }

    #[must_use]
    pub fn provider(self, provider: impl Into<String>) -> Self {
        let provider = provider.into();
        self.set("llm.provider", |c| c.llm.provider = provider)
    }

    #[must_use]
    pub fn fallback_provider(self, provider: impl Into<String>) -> Self {
        let provider = provider.into();
        self.set("llm.fallback_provider", |c| {
            c.llm.fallback_provider = Some(provider);
        })
    }

    #[must_use]
    pub fn prompt_template(self, template: impl Into<String>) -> Self {
        let template = template.into();
        self.set("llm.prompt_template", |c| c.llm.prompt_template = template)
    }

    #[must_use]
    pub fn call_budget(self, budget: u32) -> Self {
        self.set("llm.call_budget", |c| c.llm.call_budget = Some(budget))
    }

    #[must_use]
    pub fn max_turns(self, max_turns: u32) -> Self {
        self.set("conversation.max_turns", |c| {
            c.conversation.max_turns = max_turns;
        })
    }

    #[must_use]
    pub fn min_requirements(self, min: usize) -> Self {
        self.set("conversation.min_requirements", |c| {
            c.conversation.min_requirements = min;
        })
    }

    #[must_use]
    pub fn required_categories<I, S>(self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        self.set("conversation.required_categories", |c| {
            c.conversation.required_categories = categories;
        })
    }

    #[must_use]
    pub fn document_max_bytes(self, max_bytes: usize) -> Self {
        self.set("documents.max_bytes", |c| c.documents.max_bytes = max_bytes)
    }

    #[must_use]
    pub fn extract_document_requirements(self, enabled: bool) -> Self {
        self.set("documents.extract_requirements", |c| {
            c.documents.extract_requirements = enabled;
        })
    }

    #[must_use]
    pub fn context_max_bytes(self, max_bytes: usize) -> Self {
        self.set("context.max_bytes", |c| c.context.max_bytes = max_bytes)
    }

    #[must_use]
    pub fn min_excerpt_bytes(self, min: usize) -> Self {
        self.set("context.min_excerpt_bytes", |c| {
            c.context.min_excerpt_bytes = min;
        })
    }

    #[must_use]
    pub fn max_attempts(self, attempts: u32) -> Self {
        self.set("generation.max_attempts", |c| {
            c.generation.max_attempts = attempts;
        })
    }

    #[must_use]
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.set("generation.timeout_secs", |c| c.generation.timeout_secs = secs)
    }

    #[must_use]
    pub fn backoff_ms(self, ms: u64) -> Self {
        self.set("generation.backoff_ms", |c| c.generation.backoff_ms = ms)
    }

    #[must_use]
    pub fn include_viewing_notes(self, enabled: bool) -> Self {
        self.set("export.include_viewing_notes", |c| {
            c.export.include_viewing_notes = enabled;
        })
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
