use std::collections::BTreeMap;

use super::{Config, ConfigSource};

impl Config {
    fn source_of(&self, key: &str) -> String {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
            .to_string()
    }

    /// Effective configuration as `key -> (value, source)`, sorted by key.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut out = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self.source_of(key);
            out.insert(key.to_string(), (value, source));
        };

        add("llm.provider", self.llm.provider.clone());
        if let Some(fallback) = &self.llm.fallback_provider {
            add("llm.fallback_provider", fallback.clone());
        }
        add("llm.prompt_template", self.llm.prompt_template.clone());
        if let Some(budget) = self.llm.call_budget {
            add("llm.call_budget", budget.to_string());
        }
        for (name, provider) in [("gemini", &self.llm.gemini), ("anthropic", &self.llm.anthropic)] {
            add(&format!("llm.{name}.model"), provider.model.clone());
            add(&format!("llm.{name}.api_key_env"), provider.api_key_env.clone());
            if let Some(url) = &provider.base_url {
                add(&format!("llm.{name}.base_url"), url.clone());
            }
        }

        let c = &self.conversation;
        add("conversation.max_turns", c.max_turns.to_string());
        add("conversation.min_requirements", c.min_requirements.to_string());
        add(
            "conversation.required_categories",
            c.required_categories.join(", "),
        );
        add("conversation.extract_every_turn", c.extract_every_turn.to_string());
        add("conversation.temperature", c.temperature.to_string());

        add("documents.max_bytes", self.documents.max_bytes.to_string());
        add(
            "documents.extract_requirements",
            self.documents.extract_requirements.to_string(),
        );

        add("context.max_bytes", self.context.max_bytes.to_string());
        add(
            "context.min_excerpt_bytes",
            self.context.min_excerpt_bytes.to_string(),
        );

        let g = &self.generation;
        add("generation.max_attempts", g.max_attempts.to_string());
        add("generation.timeout_secs", g.timeout_secs.to_string());
        add("generation.backoff_ms", g.backoff_ms.to_string());
        add("generation.max_output_tokens", g.max_output_tokens.to_string());
        add("generation.temperature", g.temperature.to_string());

        add(
            "export.include_viewing_notes",
            self.export.include_viewing_notes.to_string(),
        );
        add("export.default_output", self.export.default_output.clone());

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_reports_sources() {
        let mut config = Config::default();
        config.generation.max_attempts = 2;
        config
            .source_attribution
            .insert("generation.max_attempts".to_string(), ConfigSource::Config);

        let effective = config.effective_config();
        assert_eq!(
            effective.get("generation.max_attempts"),
            Some(&("2".to_string(), "config".to_string()))
        );
        assert_eq!(
            effective.get("llm.provider"),
            Some(&("gemini".to_string(), "default".to_string()))
        );
        assert!(!effective.contains_key("llm.call_budget"));
    }
}
