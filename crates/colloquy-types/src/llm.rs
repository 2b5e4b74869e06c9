//! LLM request/response types for Colloquy.
//!
//! These types model the data shapes for backend interactions: chat
//! messages, completion requests, backend selection, and error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to an LLM provider for a completion.
///
/// `messages` is the full ordered sequence sent to the backend, including
/// the leading system entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// The closed set of supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local Ollama daemon (streaming `/api/chat`).
    Ollama,
    /// Hosted OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// GitHub Models inference endpoint (OpenAI-compatible).
    GithubModels,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Ollama,
        BackendKind::OpenAi,
        BackendKind::GithubModels,
    ];

    /// Environment variable consulted for the credential when config has none.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            BackendKind::Ollama => None,
            BackendKind::OpenAi => Some("OPENAI_API_KEY"),
            BackendKind::GithubModels => Some("GITHUB_TOKEN"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ollama => write!(f, "ollama"),
            BackendKind::OpenAi => write!(f, "openai"),
            BackendKind::GithubModels => write!(f, "github_models"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "openai" => Ok(BackendKind::OpenAi),
            "github_models" | "github-models" | "github" => Ok(BackendKind::GithubModels),
            other => Err(ConfigurationError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Resolved per-backend configuration.
///
/// Built from [`BackendConfig::defaults_for`] with the matching
/// `[backends.<kind>]` table of `config.toml` laid over it (see
/// [`BackendOverrides`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Override the default endpoint for the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model identifier to use.
    pub model: String,
    /// Explicit credential. Takes priority over `api_key_env`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Environment variable holding the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Per-call timeout. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl BackendConfig {
    /// Built-in defaults for a backend kind.
    pub fn defaults_for(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Ollama => Self {
                base_url: Some("http://localhost:11434".to_string()),
                model: "mythomax:latest".to_string(),
                api_key: None,
                api_key_env: None,
                max_tokens: 4000,
                temperature: None,
                timeout_secs: None,
            },
            BackendKind::OpenAi => Self {
                base_url: Some("https://api.openai.com/v1".to_string()),
                model: "gpt-4o-mini".to_string(),
                api_key: None,
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                max_tokens: 4000,
                temperature: Some(0.7),
                timeout_secs: None,
            },
            BackendKind::GithubModels => Self {
                base_url: Some("https://models.github.ai/inference".to_string()),
                model: "openai/gpt-4o-mini".to_string(),
                api_key: None,
                api_key_env: Some("GITHUB_TOKEN".to_string()),
                max_tokens: 4000,
                temperature: Some(0.7),
                timeout_secs: None,
            },
        }
    }
}

/// One `[backends.<kind>]` table. Every key is optional; whatever is set
/// replaces the built-in default for that kind and the rest is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl BackendOverrides {
    /// Lay these overrides over `base`.
    pub fn apply_to(&self, base: BackendConfig) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url.clone().or(base.base_url),
            model: self.model.clone().unwrap_or(base.model),
            api_key: self.api_key.clone().or(base.api_key),
            api_key_env: self.api_key_env.clone().or(base.api_key_env),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            temperature: self.temperature.or(base.temperature),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
        }
    }
}

/// A backend kind paired with its resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSelection {
    pub kind: BackendKind,
    pub config: BackendConfig,
}
