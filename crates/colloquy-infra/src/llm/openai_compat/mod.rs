//! Hosted backends that speak the OpenAI chat-completions protocol.
//!
//! OpenAI and GitHub Models differ only in base URL and credential, so one
//! provider type covers both. Requests are non-streaming: a turn needs the
//! whole reply before it can be sanitized.

pub mod config;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use colloquy_core::llm::provider::LlmProvider;
use colloquy_types::llm::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage,
};

use self::config::OpenAiCompatConfig;

/// Chat-completions client bound to one endpoint and default model.
///
/// No `Debug`: the inner client carries the key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_base(&config.base_url)
                .with_api_key(config.api_key.expose_secret()),
        );
        Self {
            client,
            provider_name: config.provider_name,
            model: config.model,
        }
    }

    pub fn openai(api_key: SecretString, model: &str) -> Self {
        Self::new(OpenAiCompatConfig::openai(api_key, model))
    }

    pub fn github_models(api_key: SecretString, model: &str) -> Self {
        Self::new(OpenAiCompatConfig::github_models(api_key, model))
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let model = match request.model.as_str() {
            "" => self.model.clone(),
            m => m.to_string(),
        };
        CreateChatCompletionRequest {
            model,
            messages: request.messages.iter().map(to_openai_message).collect(),
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

fn to_openai_message(message: &ChatMessage) -> ChatCompletionRequestMessage {
    let text = message.content.clone();
    match message.role {
        MessageRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(text),
                name: None,
            })
        }
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        #[allow(deprecated)]
        MessageRole::Assistant => {
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(text)),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .chat()
            .create(self.to_openai_request(request))
            .await
            .map_err(to_llm_error)?;

        // An empty choice list is a valid (if useless) reply.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let usage = response.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(CompletionResponse {
            content,
            model: response.model,
            usage,
        })
    }
}

fn to_llm_error(err: OpenAIError) -> LlmError {
    let provider = |err: &OpenAIError| LlmError::Provider {
        message: err.to_string(),
    };
    match &err {
        OpenAIError::ApiError(api) => {
            let code = api.code.as_deref().unwrap_or_default();
            let kind = api.r#type.as_deref().unwrap_or_default();
            if is_auth_failure(code, kind, &api.message) {
                LlmError::AuthenticationFailed
            } else if matches!(code, "rate_limit_exceeded" | "RateLimitReached")
                || kind == "rate_limit_error"
            {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else {
                provider(&err)
            }
        }
        OpenAIError::Reqwest(http) => match http.status().map(|s| s.as_u16()) {
            Some(401 | 403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            _ => provider(&err),
        },
        OpenAIError::JSONDeserialize(_, body) => {
            LlmError::Deserialization(format!("unexpected response body: {body}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => provider(&err),
    }
}

/// OpenAI reports bad keys by code; GitHub Models often only by message.
fn is_auth_failure(code: &str, kind: &str, message: &str) -> bool {
    matches!(code, "authentication_error" | "unauthorized" | "invalid_api_key")
        || kind == "authentication_error"
        || message.contains("Incorrect API key")
        || message.contains("Bad credentials")
}
