//! Application error type mapping to HTTP status codes and envelope format.

use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use colloquy_types::error::{
    ConfigurationError, ConversationError, GenerateError, MemoryError, ReferenceError,
    RegistryError, RepositoryError,
};

use crate::http::response::ApiMeta;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Persona registry errors.
    Registry(RegistryError),
    /// Memory store errors.
    Memory(MemoryError),
    /// Conversation setup or storage errors.
    Conversation(ConversationError),
    /// Backend selection or credential errors.
    Configuration(ConfigurationError),
    /// A backend call failed.
    Generate(GenerateError),
    /// Unknown resource outside the registry (e.g. conversation id).
    NotFound(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        AppError::Registry(e)
    }
}

impl From<MemoryError> for AppError {
    fn from(e: MemoryError) -> Self {
        AppError::Memory(e)
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(e: ConfigurationError) -> Self {
        AppError::Configuration(e)
    }
}

impl From<GenerateError> for AppError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Configuration(inner) => AppError::Configuration(inner),
            other => AppError::Generate(other),
        }
    }
}

fn reference(e: &ReferenceError) -> (StatusCode, &'static str, String) {
    (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", e.to_string())
}

fn storage(e: &RepositoryError) -> (StatusCode, &'static str, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Registry(RegistryError::Reference(e))
            | AppError::Memory(MemoryError::Reference(e))
            | AppError::Conversation(ConversationError::Reference(e)) => reference(e),
            AppError::Registry(RegistryError::Storage(e))
            | AppError::Memory(MemoryError::Storage(e))
            | AppError::Conversation(ConversationError::Storage(e)) => storage(e),
            AppError::Registry(RegistryError::InvalidAgent(msg))
            | AppError::Conversation(ConversationError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Configuration(e) => {
                (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR", e.to_string())
            }
            AppError::Generate(e) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    data: Option<()>,
    meta: ApiMeta,
    errors: [ErrorDetail; 1],
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = ErrorEnvelope {
            data: None,
            meta: ApiMeta::since(Instant::now()),
            errors: [ErrorDetail { code, message }],
        };
        (status, Json(body)).into_response()
    }
}
