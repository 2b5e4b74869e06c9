use thiserror::Error;

use crate::agent::AgentId;
use crate::llm::{BackendKind, LlmError};

/// Missing or invalid backend setup. Detected before any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unsupported backend: '{0}'")]
    UnsupportedBackend(String),

    #[error("no credential for backend '{backend}' (set api_key in config or {env_var})")]
    MissingCredential { backend: BackendKind, env_var: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Remote-service failure, wrapped with the name of the backend that raised it.
#[derive(Debug, Error)]
#[error("{backend} backend failed: {cause}")]
pub struct BackendError {
    pub backend: BackendKind,
    #[source]
    pub cause: LlmError,
}

impl BackendError {
    pub fn new(backend: BackendKind, cause: LlmError) -> Self {
        Self { backend, cause }
    }
}

/// Failure of a single `generate` call.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Operation against an agent that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("unknown agent name: '{0}'")]
    UnknownAgentName(String),
}

/// Errors from repository operations (storage layer).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from memory store operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Errors from persona registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid agent: {0}")]
    InvalidAgent(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Errors that abort a conversation run.
///
/// Backend and configuration failures never appear here: they are contained
/// per turn and surface as error notices in the transcript.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("invalid conversation request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(RepositoryError),

    #[error(transparent)]
    Reference(ReferenceError),
}

impl From<MemoryError> for ConversationError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::Storage(inner) => ConversationError::Storage(inner),
            MemoryError::Reference(inner) => ConversationError::Reference(inner),
        }
    }
}

impl From<RegistryError> for ConversationError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidAgent(msg) => ConversationError::InvalidRequest(msg),
            RegistryError::Storage(inner) => ConversationError::Storage(inner),
            RegistryError::Reference(inner) => ConversationError::Reference(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_display() {
        let err = ConfigurationError::MissingCredential {
            backend: BackendKind::GithubModels,
            env_var: "GITHUB_TOKEN".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("github_models"));
        assert!(msg.contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_backend_error_names_backend() {
        let err = BackendError::new(
            BackendKind::Ollama,
            LlmError::Provider {
                message: "connection refused".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "ollama backend failed: provider error: connection refused"
        );
    }

    #[test]
    fn test_memory_error_into_conversation_error() {
        let id = AgentId::new();
        let err: ConversationError = MemoryError::Reference(ReferenceError::UnknownAgent(id)).into();
        assert!(matches!(err, ConversationError::Reference(ReferenceError::UnknownAgent(got)) if got == id));

        let err: ConversationError =
            MemoryError::Storage(RepositoryError::Query("disk full".to_string())).into();
        assert!(matches!(err, ConversationError::Storage(_)));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
