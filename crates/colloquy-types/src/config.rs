//! Global configuration types for Colloquy.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! context bounds, reply length, and the per-backend settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::llm::{BackendConfig, BackendKind, BackendOverrides, BackendSelection};

/// Top-level configuration.
///
/// Loaded from `~/.colloquy/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// How many of a speaker's own prior utterances are replayed each turn.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Word cap stated in every system prompt.
    #[serde(default = "default_max_reply_words")]
    pub max_reply_words: u32,

    /// Backend used when a caller does not pick one.
    #[serde(default = "default_backend")]
    pub default_backend: String,

    #[serde(default)]
    pub backends: BackendsConfig,
}

fn default_history_limit() -> u32 {
    20
}

fn default_max_reply_words() -> u32 {
    20
}

fn default_backend() -> String {
    "ollama".to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_reply_words: default_max_reply_words(),
            default_backend: default_backend(),
            backends: BackendsConfig::default(),
        }
    }
}

/// One optional table per backend kind, each a partial override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama: Option<BackendOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<BackendOverrides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_models: Option<BackendOverrides>,
}

impl BackendsConfig {
    /// Built-in defaults for `kind` with its table, if any, laid over them.
    pub fn get(&self, kind: BackendKind) -> BackendConfig {
        let overrides = match kind {
            BackendKind::Ollama => self.ollama.as_ref(),
            BackendKind::OpenAi => self.openai.as_ref(),
            BackendKind::GithubModels => self.github_models.as_ref(),
        };
        let defaults = BackendConfig::defaults_for(kind);
        match overrides {
            Some(overrides) => overrides.apply_to(defaults),
            None => defaults,
        }
    }
}

impl GlobalConfig {
    /// Resolve a backend by name, or the configured default when `name` is `None`.
    ///
    /// Unknown names fail with [`ConfigurationError::UnsupportedBackend`].
    pub fn select_backend(&self, name: Option<&str>) -> Result<BackendSelection, ConfigurationError> {
        let kind: BackendKind = name.unwrap_or(&self.default_backend).parse()?;
        Ok(BackendSelection {
            kind,
            config: self.backends.get(kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.max_reply_words, 20);
        assert_eq!(config.default_backend, "ollama");
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.history_limit, 20);
        assert!(config.backends.openai.is_none());
    }

    #[test]
    fn test_global_config_deserialize_with_backends() {
        let toml_str = r#"
history_limit = 10
default_backend = "github_models"

[backends.github_models]
model = "openai/gpt-4.1-mini"
max_tokens = 512
temperature = 0.3
timeout_secs = 60

[backends.ollama]
base_url = "http://gpu-box:11434"
model = "mistral:7b"
max_tokens = 256
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.history_limit, 10);

        let selection = config.select_backend(None).unwrap();
        assert_eq!(selection.kind, BackendKind::GithubModels);
        assert_eq!(selection.config.model, "openai/gpt-4.1-mini");
        assert_eq!(selection.config.timeout_secs, Some(60));

        let ollama = config.select_backend(Some("ollama")).unwrap();
        assert_eq!(ollama.config.base_url.as_deref(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_partial_backend_table_keeps_other_settings() {
        let toml_str = r#"
history_limit = 5
max_reply_words = 12

[backends.openai]
api_key_env = "MY_KEY"

[backends.github_models]
model = "openai/gpt-4.1-mini"
max_tokens = 512
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.max_reply_words, 12);

        let openai = config.select_backend(Some("openai")).unwrap().config;
        assert_eq!(openai.api_key_env.as_deref(), Some("MY_KEY"));
        assert_eq!(openai.model, "gpt-4o-mini");
        assert_eq!(openai.max_tokens, 4000);

        let github = config.select_backend(Some("github_models")).unwrap().config;
        assert_eq!(github.model, "openai/gpt-4.1-mini");
        assert_eq!(github.max_tokens, 512);
        assert_eq!(github.temperature, Some(0.7));
        assert_eq!(github.api_key_env.as_deref(), Some("GITHUB_TOKEN"));
    }

    #[test]
    fn test_select_backend_falls_back_to_builtin_defaults() {
        let config = GlobalConfig::default();
        let selection = config.select_backend(Some("openai")).unwrap();
        assert_eq!(selection.config, BackendConfig::defaults_for(BackendKind::OpenAi));
    }

    #[test]
    fn test_select_backend_unsupported() {
        let config = GlobalConfig::default();
        let err = config.select_backend(Some("bard")).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnsupportedBackend(_)));
    }
}
