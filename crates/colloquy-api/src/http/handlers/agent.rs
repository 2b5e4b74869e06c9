//! Agent handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use colloquy_core::repository::memory::MemoryRepository;
use colloquy_types::agent::{Agent, DeclareAgentRequest};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Agent plus the size of its memory log.
#[derive(Debug, Serialize)]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub message_count: u64,
}

async fn view(state: &AppState, agent: Agent) -> Result<AgentView, AppError> {
    let message_count = state.engine.memory().count(&agent.id).await?;
    Ok(AgentView {
        agent,
        message_count,
    })
}

/// POST /api/v1/agents - Declare an agent (idempotent by name).
pub async fn create_agent(
    State(state): State<AppState>,
    Json(body): Json<DeclareAgentRequest>,
) -> Result<Json<ApiResponse<AgentView>>, AppError> {
    let start = Instant::now();

    let agent = state.registry.declare(&body.name, &body.persona).await?;
    let href = format!("/api/v1/agents/{}", agent.name);
    let agent = view(&state, agent).await?;

    let resp = ApiResponse::timed(agent, start)
        .with_link("self", &href)
        .with_link("memory", &format!("{href}/memory"));

    Ok(Json(resp))
}

/// GET /api/v1/agents - List agents ordered by name.
pub async fn list_agents(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AgentView>>>, AppError> {
    let start = Instant::now();

    let agents = state.registry.list().await?;
    let mut views = Vec::with_capacity(agents.len());
    for agent in agents {
        views.push(view(&state, agent).await?);
    }

    Ok(Json(
        ApiResponse::timed(views, start).with_link("self", "/api/v1/agents"),
    ))
}

/// GET /api/v1/agents/{name} - Get an agent by name.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<AgentView>>, AppError> {
    let start = Instant::now();

    let agent = state.registry.get_by_name(&name).await?;
    let href = format!("/api/v1/agents/{}", agent.name);
    let agent = view(&state, agent).await?;

    let resp = ApiResponse::timed(agent, start)
        .with_link("self", &href)
        .with_link("memory", &format!("{href}/memory"));

    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_types::error::{ReferenceError, RegistryError};

    use crate::testing::test_state;

    fn declare(name: &str, persona: &str) -> Json<DeclareAgentRequest> {
        Json(DeclareAgentRequest {
            name: name.to_string(),
            persona: persona.to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_is_idempotent_by_name() {
        let state = test_state().await;
        let first = create_agent(State(state.clone()), declare("Bob", "A blacksmith."))
            .await
            .unwrap();
        let second = create_agent(State(state.clone()), declare(" Bob ", "Someone else."))
            .await
            .unwrap();

        let first = first.0.data;
        let second = second.0.data;
        assert_eq!(first.agent.id, second.agent.id);
        assert_eq!(second.agent.persona, "A blacksmith.");
        assert_eq!(second.message_count, 0);
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let state = test_state().await;
        create_agent(State(state.clone()), declare("Charlie", "A bard."))
            .await
            .unwrap();
        create_agent(State(state.clone()), declare("Alice", "A merchant."))
            .await
            .unwrap();

        let listed = list_agents(State(state.clone())).await.unwrap().0.data;
        let names: Vec<&str> = listed.iter().map(|v| v.agent.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Charlie"]);

        let alice = get_agent(State(state), Path("Alice".to_string()))
            .await
            .unwrap();
        assert_eq!(alice.0.links["memory"], "/api/v1/agents/Alice/memory");
    }

    #[tokio::test]
    async fn test_get_unknown_agent() {
        let state = test_state().await;
        let err = get_agent(State(state), Path("Ghost".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Registry(RegistryError::Reference(ReferenceError::UnknownAgentName(_)))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let state = test_state().await;
        let err = create_agent(State(state), declare("  ", "Nobody."))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Registry(RegistryError::InvalidAgent(_))));
    }
}
