//! Agent repository trait definition.

use colloquy_types::agent::{Agent, AgentId};
use colloquy_types::error::RepositoryError;

/// Repository trait for agent persistence.
///
/// Implementations live in colloquy-infra (e.g., SqliteAgentRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AgentRepository: Send + Sync {
    /// Insert `agent` unless an agent with the same name already exists.
    ///
    /// Returns the stored agent in either case, so declaring twice yields
    /// the first definition unchanged.
    fn insert_if_absent(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<Agent, RepositoryError>> + Send;

    /// Get an agent by its unique ID.
    fn get_by_id(
        &self,
        id: &AgentId,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// Get an agent by its unique name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// List all agents, ordered by name.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Agent>, RepositoryError>> + Send;
}
