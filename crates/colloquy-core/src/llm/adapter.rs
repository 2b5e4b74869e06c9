//! Backend adapter port.
//!
//! The turn engine talks to inference services only through
//! [`BackendAdapter`]. The infra crate implements it by resolving
//! credentials, building a provider for the selected [`BackendKind`], and
//! dispatching one completion.

use colloquy_types::error::GenerateError;
use colloquy_types::llm::{BackendConfig, BackendKind, ChatMessage};

/// Uniform "generate a reply" capability over every backend variant.
pub trait BackendAdapter: Send + Sync {
    /// Send `system_prompt` followed by `history` to the backend and return
    /// the raw reply text.
    ///
    /// No retries. Configuration problems are reported before any network
    /// I/O; every remote failure comes back as a `BackendError` naming the
    /// backend.
    fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        kind: BackendKind,
        config: &BackendConfig,
    ) -> impl std::future::Future<Output = Result<String, GenerateError>> + Send;
}
