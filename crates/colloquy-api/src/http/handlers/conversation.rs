//! Conversation handlers for the REST API.
//!
//! POST starts the turn engine in a spawned task and answers 202 with the
//! job id; clients poll GET for the transcript so far and may DELETE to stop
//! scheduling further turns.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use colloquy_core::conversation::engine::ConversationRequest;
use colloquy_core::persona::DEFAULT_OPENING;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::jobs::ConversationSnapshot;
use crate::state::AppState;

/// Request body for starting a conversation.
#[derive(Debug, Deserialize)]
pub struct StartConversationRequest {
    /// Agent names in speaking order.
    pub agents: Vec<String>,
    /// Opening prompt. Defaults to the traveler scene.
    #[serde(default)]
    pub prompt: Option<String>,
    pub turns: u32,
    /// Backend name. Defaults to `default_backend` from config.
    #[serde(default)]
    pub backend: Option<String>,
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid conversation id: '{raw}'")))
}

fn not_found(id: &Uuid) -> AppError {
    AppError::NotFound(format!("conversation {id} not found"))
}

/// POST /api/v1/conversations - Start a conversation in the background.
pub async fn start_conversation(
    State(state): State<AppState>,
    Json(body): Json<StartConversationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationSnapshot>>), AppError> {
    let start = Instant::now();

    let backend = state.config.select_backend(body.backend.as_deref())?;
    let agents = state.registry.resolve(&body.agents).await?;
    let request = ConversationRequest {
        agents,
        initial_prompt: body.prompt.unwrap_or_else(|| DEFAULT_OPENING.to_string()),
        turns: body.turns,
        backend,
    };
    request.validate()?;

    let names = request.agents.iter().map(|a| a.name.clone()).collect();
    let (id, cancel) = state.conversations.start(names, request.turns);

    let engine = state.engine.clone();
    let jobs = state.conversations.clone();
    tokio::spawn(
        async move {
            let result = engine
                .run_with(&request, &cancel, |turn| jobs.record_turn(&id, turn))
                .await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "conversation aborted");
            }
            jobs.finish(&id, result);
        }
        .instrument(info_span!("conversation", conversation.id = %id)),
    );

    let snapshot = state
        .conversations
        .snapshot(&id)
        .ok_or_else(|| AppError::Internal("conversation vanished after start".to_string()))?;
    let href = format!("/api/v1/conversations/{id}");
    let resp = ApiResponse::timed(snapshot, start).with_link("self", &href);

    Ok((StatusCode::ACCEPTED, Json(resp)))
}

/// GET /api/v1/conversations - List conversations started by this server.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ConversationSnapshot>>> {
    let start = Instant::now();
    Json(
        ApiResponse::timed(state.conversations.list(), start)
            .with_link("self", "/api/v1/conversations"),
    )
}

/// GET /api/v1/conversations/{id} - Status and transcript so far.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<ConversationSnapshot>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&raw_id)?;

    let snapshot = state.conversations.snapshot(&id).ok_or_else(|| not_found(&id))?;
    let resp = ApiResponse::timed(snapshot, start)
        .with_link("self", &format!("/api/v1/conversations/{id}"));

    Ok(Json(resp))
}

/// DELETE /api/v1/conversations/{id} - Stop scheduling further turns.
///
/// Returns immediately; the status flips to `cancelled` once the turn in
/// flight has been persisted.
pub async fn cancel_conversation(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<ConversationSnapshot>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&raw_id)?;

    state.conversations.cancel(&id).ok_or_else(|| not_found(&id))?;
    tracing::info!(conversation.id = %id, "cancellation requested");

    let snapshot = state.conversations.snapshot(&id).ok_or_else(|| not_found(&id))?;
    Ok(Json(ApiResponse::timed(snapshot, start)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use colloquy_core::repository::memory::MemoryRepository;
    use colloquy_types::conversation::ConversationStatus;
    use colloquy_types::error::{ConversationError, RegistryError};

    use crate::testing::test_state;

    async fn cast(state: &AppState) {
        state.registry.declare("Alice", "A merchant.").await.unwrap();
        state.registry.declare("Bob", "A blacksmith.").await.unwrap();
    }

    fn body(agents: &[&str], turns: u32, backend: Option<&str>) -> Json<StartConversationRequest> {
        Json(StartConversationRequest {
            agents: agents.iter().map(|a| a.to_string()).collect(),
            prompt: Some("A traveler arrives.".to_string()),
            turns,
            backend: backend.map(str::to_string),
        })
    }

    async fn wait_finished(state: &AppState, id: &Uuid) -> ConversationSnapshot {
        for _ in 0..400 {
            let snapshot = state.conversations.snapshot(id).unwrap();
            if snapshot.status != ConversationStatus::Running {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("conversation {id} did not finish");
    }

    #[tokio::test]
    async fn test_start_runs_in_background_and_persists_notices() {
        let state = test_state().await;
        cast(&state).await;

        let (status, Json(resp)) =
            start_conversation(State(state.clone()), body(&["Alice", "Bob"], 2, None))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = resp.data.id;

        let done = wait_finished(&state, &id).await;
        assert_eq!(done.status, ConversationStatus::Completed);
        assert_eq!(done.transcript.len(), 2);
        assert!(done.transcript.iter().all(|t| t.failed));
        assert!(
            done.transcript[0]
                .utterance
                .starts_with("Error generating response for Alice with ollama backend:")
        );

        let alice = state.registry.get_by_name("Alice").await.unwrap();
        assert_eq!(state.engine.memory().count(&alice.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_start_rejects_unknown_agent() {
        let state = test_state().await;
        cast(&state).await;
        let err = start_conversation(State(state.clone()), body(&["Alice", "Ghost"], 2, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Registry(RegistryError::Reference(_))));
        assert!(state.conversations.list().is_empty());
    }

    #[tokio::test]
    async fn test_start_rejects_zero_turns_and_empty_cast() {
        let state = test_state().await;
        cast(&state).await;
        let err = start_conversation(State(state.clone()), body(&["Alice"], 0, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conversation(ConversationError::InvalidRequest(_))
        ));

        let err = start_conversation(State(state.clone()), body(&[], 3, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conversation(ConversationError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_start_rejects_repeated_agent() {
        let state = test_state().await;
        cast(&state).await;
        for agents in [["Alice", "Alice", "Bob"], ["Alice", "Bob", "Alice"]] {
            let err = start_conversation(State(state.clone()), body(&agents, 3, None))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AppError::Conversation(ConversationError::InvalidRequest(_))
            ));
        }
        assert!(state.conversations.list().is_empty());

        let alice = state.registry.get_by_name("Alice").await.unwrap();
        assert_eq!(state.engine.memory().count(&alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_start_rejects_unsupported_backend() {
        let state = test_state().await;
        cast(&state).await;
        let err = start_conversation(State(state), body(&["Alice"], 1, Some("llamafile")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_cancel_stops_scheduling() {
        let state = test_state().await;
        cast(&state).await;

        let (_, Json(resp)) =
            start_conversation(State(state.clone()), body(&["Alice", "Bob"], 1000, None))
                .await
                .unwrap();
        let id = resp.data.id;

        cancel_conversation(State(state.clone()), Path(id.to_string()))
            .await
            .unwrap();

        let done = wait_finished(&state, &id).await;
        assert_eq!(done.status, ConversationStatus::Cancelled);
        assert!(done.transcript.len() < 1000);
    }

    #[tokio::test]
    async fn test_get_unknown_and_malformed_ids() {
        let state = test_state().await;
        let err = get_conversation(State(state.clone()), Path(Uuid::now_v7().to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = get_conversation(State(state), Path("not-an-id".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
