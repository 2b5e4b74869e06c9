//! Per-agent memory handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde_json::json;

use colloquy_core::repository::memory::MemoryRepository;
use colloquy_types::memory::MemoryMessage;

use crate::http::error::AppError;
use crate::http::extractors::query::MemoryQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/agents/{name}/memory - Read an agent's memory, oldest first.
pub async fn get_memory(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<MemoryQuery>,
) -> Result<Json<ApiResponse<Vec<MemoryMessage>>>, AppError> {
    let start = Instant::now();
    let role = query.role()?;

    let agent = state.registry.get_by_name(&name).await?;
    let messages = state
        .engine
        .memory()
        .read_tail(&agent.id, query.limit, role)
        .await?;

    let resp = ApiResponse::timed(messages, start)
        .with_link("self", &format!("/api/v1/agents/{}/memory", agent.name))
        .with_link("agent", &format!("/api/v1/agents/{}", agent.name));

    Ok(Json(resp))
}

/// DELETE /api/v1/agents/{name}/memory - Wipe an agent's memory.
pub async fn clear_memory(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();

    let agent = state.registry.get_by_name(&name).await?;
    let cleared = state.engine.memory().clear(&agent.id).await?;
    tracing::info!(agent = %agent.name, cleared, "memory cleared");

    Ok(Json(ApiResponse::timed(
        json!({"agent": agent.name, "cleared": cleared}),
        start,
    )))
}
