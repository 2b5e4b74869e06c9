//! Stateless single-prompt endpoint.
//!
//! POST /api/v1/chat
//!
//! Sends one user message to a backend with no persona and no memory, and
//! returns the sanitized reply. Nothing is persisted.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use colloquy_core::llm::adapter::BackendAdapter;
use colloquy_core::sanitize::sanitize;
use colloquy_types::llm::{BackendKind, ChatMessage};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub backend: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub backend: BackendKind,
    pub model: String,
}

/// POST /api/v1/chat - One-shot prompt to a backend.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let start = Instant::now();

    if body.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    let selection = state.config.select_backend(body.backend.as_deref())?;

    let raw = state
        .engine
        .backend()
        .generate(
            "",
            &[ChatMessage::user(body.prompt)],
            selection.kind,
            &selection.config,
        )
        .await?;

    let reply = ChatReply {
        response: sanitize(&raw),
        backend: selection.kind,
        model: selection.config.model,
    };

    Ok(Json(ApiResponse::timed(reply, start)))
}
