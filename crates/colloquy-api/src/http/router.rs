//! Route table for the REST surface.
//!
//! Everything lives under `/api/v1`; `/health` is also mounted at the root
//! for load balancers that don't know the prefix.

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers::{agent, chat, conversation, memory};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", v1())
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn v1() -> Router<AppState> {
    Router::new()
        .route("/agents", get(agent::list_agents).post(agent::create_agent))
        .route("/agents/{name}", get(agent::get_agent))
        .route(
            "/agents/{name}/memory",
            get(memory::get_memory).delete(memory::clear_memory),
        )
        .route(
            "/conversations",
            get(conversation::list_conversations).post(conversation::start_conversation),
        )
        .route(
            "/conversations/{id}",
            get(conversation::get_conversation).delete(conversation::cancel_conversation),
        )
        .route("/chat", post(chat::chat))
        .route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
