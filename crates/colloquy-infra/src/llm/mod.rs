//! LLM backend implementations.
//!
//! Contains the concrete [`LlmProvider`] implementations (Ollama and the
//! OpenAI-compatible family), the provider factory ([`create_provider`]),
//! credential resolution, and [`HttpBackendAdapter`], the
//! [`BackendAdapter`] used by the turn engine.
//!
//! [`LlmProvider`]: colloquy_core::llm::provider::LlmProvider

pub mod ollama;
pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;
use tracing::{Instrument, debug, field, info_span};

use colloquy_core::llm::adapter::BackendAdapter;
use colloquy_core::llm::box_provider::BoxLlmProvider;
use colloquy_types::error::{BackendError, ConfigurationError, GenerateError};
use colloquy_types::llm::{BackendConfig, BackendKind, ChatMessage, CompletionRequest, LlmError};

use self::ollama::{DEFAULT_OLLAMA_URL, OllamaProvider};
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Resolve the credential for `kind` from config first, then the process
/// environment.
///
/// Hosted backends without a credential fail with
/// [`ConfigurationError::MissingCredential`]. Ollama never needs one.
pub fn resolve_credential(
    kind: BackendKind,
    config: &BackendConfig,
) -> Result<Option<SecretString>, ConfigurationError> {
    resolve_credential_with(kind, config, |name| std::env::var(name).ok())
}

fn resolve_credential_with(
    kind: BackendKind,
    config: &BackendConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<SecretString>, ConfigurationError> {
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        return Ok(Some(SecretString::from(key.to_string())));
    }

    let env_var = config
        .api_key_env
        .as_deref()
        .or(kind.default_api_key_env());

    if let Some(name) = env_var {
        if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
            return Ok(Some(SecretString::from(value)));
        }
    }

    match (kind, env_var) {
        (BackendKind::Ollama, _) => Ok(None),
        (_, Some(name)) => Err(ConfigurationError::MissingCredential {
            backend: kind,
            env_var: name.to_string(),
        }),
        (_, None) => Err(ConfigurationError::MissingCredential {
            backend: kind,
            env_var: String::new(),
        }),
    }
}

/// Create a [`BoxLlmProvider`] for a backend kind.
///
/// `api_key` must already be resolved; hosted backends reject `None`.
pub fn create_provider(
    kind: BackendKind,
    config: &BackendConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, ConfigurationError> {
    if config.model.trim().is_empty() {
        return Err(ConfigurationError::Invalid(format!(
            "backend '{kind}' has no model configured"
        )));
    }

    match kind {
        BackendKind::Ollama => {
            let base_url = config
                .base_url
                .clone()
                .or_else(|| std::env::var("OLLAMA_BASE_URL").ok())
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            Ok(BoxLlmProvider::new(OllamaProvider::new(
                base_url,
                config.model.clone(),
            )))
        }
        BackendKind::OpenAi | BackendKind::GithubModels => {
            let key = api_key.ok_or_else(|| ConfigurationError::MissingCredential {
                backend: kind,
                env_var: kind.default_api_key_env().unwrap_or_default().to_string(),
            })?;

            let provider = match (kind, config.base_url.as_deref()) {
                (_, Some(base_url)) => OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                    provider_name: kind.to_string(),
                    base_url: base_url.to_string(),
                    api_key: key,
                    model: config.model.clone(),
                }),
                (BackendKind::GithubModels, None) => {
                    OpenAiCompatibleProvider::github_models(key, &config.model)
                }
                _ => OpenAiCompatibleProvider::openai(key, &config.model),
            };
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// [`BackendAdapter`] that talks to real inference services over HTTP.
///
/// Stateless: credentials and providers are resolved per call, so config
/// and environment changes take effect on the next turn. An empty
/// `system_prompt` sends `history` alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpBackendAdapter;

impl HttpBackendAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl BackendAdapter for HttpBackendAdapter {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        kind: BackendKind,
        config: &BackendConfig,
    ) -> Result<String, GenerateError> {
        let api_key = resolve_credential(kind, config)?;
        let provider = create_provider(kind, config, api_key)?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        messages.extend(history.iter().cloned());

        let request = CompletionRequest {
            model: config.model.clone(),
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
        );

        let call = provider.complete(&request);
        let result = match config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
                .instrument(span.clone())
                .await
                .unwrap_or(Err(LlmError::Timeout(secs))),
            None => call.instrument(span.clone()).await,
        };

        let response = result.map_err(|cause| BackendError::new(kind, cause))?;
        span.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", response.usage.output_tokens);
        debug!(
            backend = %kind,
            model = %response.model,
            chars = response.content.len(),
            "backend replied"
        );

        Ok(response.content)
    }
}
