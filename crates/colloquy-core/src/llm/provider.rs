//! LlmProvider trait definition.
//!
//! This is the core abstraction that every backend variant implements.

use colloquy_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Ollama, OpenAI, GitHub Models).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). A provider
/// returns the full reply text; streaming transports assemble their chunks
/// before returning.
///
/// Implementations live in colloquy-infra (e.g., `OllamaProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
