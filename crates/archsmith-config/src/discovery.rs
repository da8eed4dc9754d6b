use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use archsmith_utils::error::ConfigError;

use super::{CliArgs, Config, ConfigSource};

/// Environment variable naming a directory that holds `config.toml`
pub const HOME_ENV: &str = "ARCHSMITH_HOME";

/// Environment variable overriding `llm.provider`
pub const PROVIDER_ENV: &str = "ARCHSMITH_LLM_PROVIDER";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<TomlLlm>,
    conversation: Option<TomlConversation>,
    documents: Option<TomlDocuments>,
    context: Option<TomlContext>,
    generation: Option<TomlGeneration>,
    export: Option<TomlExport>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLlm {
    provider: Option<String>,
    fallback_provider: Option<String>,
    prompt_template: Option<String>,
    call_budget: Option<u32>,
    gemini: Option<TomlProvider>,
    anthropic: Option<TomlProvider>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlProvider {
    model: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConversation {
    max_turns: Option<u32>,
    min_requirements: Option<usize>,
    required_categories: Option<Vec<String>>,
    extract_every_turn: Option<bool>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDocuments {
    max_bytes: Option<usize>,
    extract_requirements: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlContext {
    max_bytes: Option<usize>,
    min_excerpt_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGeneration {
    max_attempts: Option<u32>,
    timeout_secs: Option<u64>,
    backoff_ms: Option<u64>,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlExport {
    include_viewing_notes: Option<bool>,
    default_output: Option<String>,
}

/// Overwrite `target` when `value` is present and record where it came from.
fn apply<T>(
    target: &mut T,
    value: Option<T>,
    key: &str,
    source: ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if let Some(v) = value {
        *target = v;
        attribution.insert(key.to_string(), source);
    }
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// The config file is the explicit `--config` path, else `$ARCHSMITH_HOME/config.toml`,
    /// else the nearest `.archsmith/config.toml` above the current directory, else the
    /// user-level `archsmith/config.toml` under the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read or parsed, or validation fails.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("cannot determine current directory: {e}"),
        })?;

        let path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::home_config_file()
                .or(Self::discover_config_file_from(&start_dir)?)
                .or_else(Self::user_config_file),
        };

        Self::load(path.as_deref(), cli_args)
    }

    /// Discover configuration starting from a specific directory.
    ///
    /// Path-driven variant for tests: only the explicit path and the upward search are
    /// consulted, so the result does not depend on `ARCHSMITH_HOME` or the user's home.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read or parsed, or validation fails.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };
        Self::load(path.as_deref(), cli_args)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.archsmith/config.toml`, stopping at
    /// repository root markers (.git, .hg, .svn) or the filesystem root.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for permission failures.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".archsmith").join("config.toml");
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    fn home_config_file() -> Option<PathBuf> {
        let home = env::var_os(HOME_ENV)?;
        let path = PathBuf::from(home).join("config.toml");
        path.is_file().then_some(path)
    }

    fn user_config_file() -> Option<PathBuf> {
        let path = dirs::config_dir()?.join("archsmith").join("config.toml");
        path.is_file().then_some(path)
    }

    /// Load configuration from an optional file and apply env and CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read or parsed, or validation fails.
    pub fn load(path: Option<&Path>, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = path {
            let file_config = Self::load_config_file(path)?;
            debug!(path = %path.display(), "Loaded configuration file");
            config.apply_file(file_config);
            config.config_file = Some(path.to_path_buf());
        }

        if let Ok(provider) = env::var(PROVIDER_ENV)
            && !provider.trim().is_empty()
        {
            config.llm.provider = provider.trim().to_string();
            config
                .source_attribution
                .insert("llm.provider".to_string(), ConfigSource::Env);
        }

        if let Some(provider) = &cli_args.provider {
            config.llm.provider = provider.clone();
            config
                .source_attribution
                .insert("llm.provider".to_string(), ConfigSource::Cli);
        }

        if cli_args.dry_run {
            config.llm.provider = "simulated".to_string();
            config.llm.fallback_provider = None;
            config
                .source_attribution
                .insert("llm.provider".to_string(), ConfigSource::Cli);
        }

        config.validate()?;
        Ok(config)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::InvalidFile(format!("{}: {e}", path.display()))
            }
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }

    fn apply_file(&mut self, file: TomlConfig) {
        let src = ConfigSource::Config;
        let attr = &mut self.source_attribution;

        if let Some(llm) = file.llm {
            apply(&mut self.llm.provider, llm.provider, "llm.provider", src, attr);
            if llm.fallback_provider.is_some() {
                self.llm.fallback_provider = llm.fallback_provider;
                attr.insert("llm.fallback_provider".to_string(), src);
            }
            apply(
                &mut self.llm.prompt_template,
                llm.prompt_template,
                "llm.prompt_template",
                src,
                attr,
            );
            if llm.call_budget.is_some() {
                self.llm.call_budget = llm.call_budget;
                attr.insert("llm.call_budget".to_string(), src);
            }
            for (name, section, target) in [
                ("gemini", llm.gemini, &mut self.llm.gemini),
                ("anthropic", llm.anthropic, &mut self.llm.anthropic),
            ] {
                let Some(section) = section else { continue };
                apply(
                    &mut target.model,
                    section.model,
                    &format!("llm.{name}.model"),
                    src,
                    attr,
                );
                apply(
                    &mut target.api_key_env,
                    section.api_key_env,
                    &format!("llm.{name}.api_key_env"),
                    src,
                    attr,
                );
                if section.base_url.is_some() {
                    target.base_url = section.base_url;
                    attr.insert(format!("llm.{name}.base_url"), src);
                }
            }
        }

        if let Some(c) = file.conversation {
            let t = &mut self.conversation;
            apply(&mut t.max_turns, c.max_turns, "conversation.max_turns", src, attr);
            apply(
                &mut t.min_requirements,
                c.min_requirements,
                "conversation.min_requirements",
                src,
                attr,
            );
            apply(
                &mut t.required_categories,
                c.required_categories,
                "conversation.required_categories",
                src,
                attr,
            );
            apply(
                &mut t.extract_every_turn,
                c.extract_every_turn,
                "conversation.extract_every_turn",
                src,
                attr,
            );
            apply(&mut t.temperature, c.temperature, "conversation.temperature", src, attr);
        }

        if let Some(d) = file.documents {
            apply(&mut self.documents.max_bytes, d.max_bytes, "documents.max_bytes", src, attr);
            apply(
                &mut self.documents.extract_requirements,
                d.extract_requirements,
                "documents.extract_requirements",
                src,
                attr,
            );
        }

        if let Some(c) = file.context {
            apply(&mut self.context.max_bytes, c.max_bytes, "context.max_bytes", src, attr);
            apply(
                &mut self.context.min_excerpt_bytes,
                c.min_excerpt_bytes,
                "context.min_excerpt_bytes",
                src,
                attr,
            );
        }

        if let Some(g) = file.generation {
            let t = &mut self.generation;
            apply(&mut t.max_attempts, g.max_attempts, "generation.max_attempts", src, attr);
            apply(&mut t.timeout_secs, g.timeout_secs, "generation.timeout_secs", src, attr);
            apply(&mut t.backoff_ms, g.backoff_ms, "generation.backoff_ms", src, attr);
            apply(
                &mut t.max_output_tokens,
                g.max_output_tokens,
                "generation.max_output_tokens",
                src,
                attr,
            );
            apply(&mut t.temperature, g.temperature, "generation.temperature", src, attr);
        }

        if let Some(e) = file.export {
            apply(
                &mut self.export.include_viewing_notes,
                e.include_viewing_notes,
                "export.include_viewing_notes",
                src,
                attr,
            );
            apply(
                &mut self.export.default_output,
                e.default_output,
                "export.default_output",
                src,
                attr,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(root: &Path, body: &str) -> anyhow::Result<PathBuf> {
        let dir = root.join(".archsmith");
        fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        fs::write(&path, body)?;
        Ok(path)
    }

    #[test]
    #[serial]
    fn test_defaults_without_config_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(".git"))?;

        let config = Config::discover_from(temp.path(), &CliArgs::default())?;

        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.conversation.max_turns, 12);
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.documents.max_bytes, 10 * 1024 * 1024);
        assert!(config.config_file.is_none());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_upward_discovery_and_attribution() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(".git"))?;
        write_config(
            temp.path(),
            r#"
[generation]
max_attempts = 2

[llm.anthropic]
model = "claude-3-5-haiku-latest"
"#,
        )?;
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested)?;

        let config = Config::discover_from(&nested, &CliArgs::default())?;

        assert_eq!(config.generation.max_attempts, 2);
        assert_eq!(config.llm.anthropic.model, "claude-3-5-haiku-latest");
        assert_eq!(
            config.source_attribution.get("generation.max_attempts"),
            Some(&ConfigSource::Config)
        );
        assert!(!config.source_attribution.contains_key("generation.timeout_secs"));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_search_stops_at_repository_root() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        write_config(temp.path(), "[generation]\nmax_attempts = 5\n")?;
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git"))?;

        let found = Config::discover_config_file_from(&repo)?;
        assert!(found.is_none());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_then_cli_provider_precedence() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(".git"))?;
        write_config(temp.path(), "[llm]\nprovider = \"gemini\"\n")?;

        // SAFETY: serialized by #[serial]; no other thread reads the environment here.
        unsafe { env::set_var(PROVIDER_ENV, "anthropic") };
        let from_env = Config::discover_from(temp.path(), &CliArgs::default());
        let cli = CliArgs {
            provider: Some("simulated".to_string()),
            ..CliArgs::default()
        };
        let from_cli = Config::discover_from(temp.path(), &cli);
        unsafe { env::remove_var(PROVIDER_ENV) };

        let from_env = from_env?;
        assert_eq!(from_env.llm.provider, "anthropic");
        assert_eq!(
            from_env.source_attribution.get("llm.provider"),
            Some(&ConfigSource::Env)
        );

        let from_cli = from_cli?;
        assert_eq!(from_cli.llm.provider, "simulated");
        assert_eq!(
            from_cli.source_attribution.get("llm.provider"),
            Some(&ConfigSource::Cli)
        );
        Ok(())
    }

    #[test]
    #[serial]
    fn test_dry_run_forces_simulated_provider() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(".git"))?;
        write_config(
            temp.path(),
            "[llm]\nprovider = \"anthropic\"\nfallback_provider = \"gemini\"\n",
        )?;
        let cli = CliArgs {
            dry_run: true,
            ..CliArgs::default()
        };

        let config = Config::discover_from(temp.path(), &cli)?;
        assert_eq!(config.llm.provider, "simulated");
        assert!(config.llm.fallback_provider.is_none());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_invalid_toml_and_unknown_keys_rejected() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        fs::create_dir(temp.path().join(".git"))?;
        write_config(temp.path(), "[generation]\nmax_attempts = \"many\"\n")?;
        assert!(matches!(
            Config::discover_from(temp.path(), &CliArgs::default()),
            Err(ConfigError::InvalidFile(_))
        ));

        write_config(temp.path(), "[generation]\nretries = 4\n")?;
        assert!(matches!(
            Config::discover_from(temp.path(), &CliArgs::default()),
            Err(ConfigError::InvalidFile(_))
        ));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_explicit_missing_path_is_not_found() {
        let cli = CliArgs {
            config_path: Some(PathBuf::from("/definitely/not/here/config.toml")),
            ..CliArgs::default()
        };
        let result = Config::discover_from(Path::new("."), &cli);
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }
}
