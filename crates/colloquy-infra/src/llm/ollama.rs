//! OllamaProvider -- [`LlmProvider`] for a local Ollama daemon.
//!
//! Posts to `/api/chat` with `stream: true` and assembles the reply from the
//! newline-delimited JSON chunks the daemon sends back. No credential is
//! needed.

use serde::{Deserialize, Serialize};

use colloquy_core::llm::provider::LlmProvider;
use colloquy_types::llm::{CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage};

/// Default daemon address when neither config nor `OLLAMA_BASE_URL` sets one.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Local Ollama provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    fn to_ollama_request<'a>(&'a self, request: &'a CompletionRequest) -> OllamaChatRequest<'a> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        OllamaChatRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            stream: true,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

/// Reassembles an NDJSON body that may arrive split at arbitrary byte offsets.
#[derive(Debug, Default)]
struct ChunkAssembler {
    pending: Vec<u8>,
    content: String,
    model: Option<String>,
    usage: Usage,
    done: bool,
}

impl ChunkAssembler {
    fn push(&mut self, bytes: &[u8]) -> Result<(), LlmError> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.line(&line[..line.len() - 1])?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(String, Option<String>, Usage), LlmError> {
        let rest = std::mem::take(&mut self.pending);
        self.line(&rest)?;
        if !self.done {
            return Err(LlmError::Stream(
                "stream ended before the final chunk".to_string(),
            ));
        }
        Ok((self.content, self.model, self.usage))
    }

    fn line(&mut self, raw: &[u8]) -> Result<(), LlmError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| LlmError::Deserialization(format!("invalid UTF-8 in chunk: {e}")))?
            .trim();
        if line.is_empty() {
            return Ok(());
        }

        let chunk: OllamaChatChunk = serde_json::from_str(line)
            .map_err(|e| LlmError::Deserialization(format!("failed to parse chunk: {e}")))?;

        if let Some(error) = chunk.error {
            return Err(LlmError::Provider { message: error });
        }
        if let Some(message) = chunk.message {
            self.content.push_str(&message.content);
        }
        if chunk.model.is_some() {
            self.model = chunk.model;
        }
        if chunk.done {
            self.done = true;
            self.usage = Usage {
                input_tokens: chunk.prompt_eval_count.unwrap_or_default(),
                output_tokens: chunk.eval_count.unwrap_or_default(),
            };
        }
        Ok(())
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_ollama_request(request);
        let url = self.url();

        let mut response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("Ollama unavailable at {}: {e}", self.base_url),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let mut assembler = ChunkAssembler::default();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LlmError::Stream(e.to_string()))?
        {
            assembler.push(&chunk)?;
        }
        let (content, model, usage) = assembler.finish()?;

        Ok(CompletionResponse {
            content,
            model: model.unwrap_or_else(|| body.model.to_string()),
            usage,
        })
    }
}
