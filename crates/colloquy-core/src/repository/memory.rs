//! Memory repository trait definition.
//!
//! Each agent owns an append-only log of messages. `created_at` is strictly
//! increasing per agent and is the only ordering used by reads.

use colloquy_types::agent::AgentId;
use colloquy_types::error::MemoryError;
use colloquy_types::memory::{MemoryMessage, Role};

/// Repository trait for per-agent message logs.
pub trait MemoryRepository: Send + Sync {
    /// Append one message to the agent's log.
    ///
    /// The stored timestamp is strictly greater than every earlier timestamp
    /// for the same agent. Fails with `MemoryError::Reference` when the agent
    /// does not exist.
    fn append(
        &self,
        agent_id: &AgentId,
        role: Role,
        content: &str,
    ) -> impl std::future::Future<Output = Result<MemoryMessage, MemoryError>> + Send;

    /// The most recent `limit` messages (all when `None`), optionally
    /// restricted to one role, in ascending chronological order.
    ///
    /// An unknown agent yields an empty list.
    fn read_tail(
        &self,
        agent_id: &AgentId,
        limit: Option<u32>,
        role: Option<Role>,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryMessage>, MemoryError>> + Send;

    /// The full log in ascending chronological order.
    fn read_all(
        &self,
        agent_id: &AgentId,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryMessage>, MemoryError>> + Send {
        self.read_tail(agent_id, None, None)
    }

    /// Delete the agent's whole log in one statement. Returns rows removed.
    fn clear(
        &self,
        agent_id: &AgentId,
    ) -> impl std::future::Future<Output = Result<u64, MemoryError>> + Send;

    /// Number of stored messages for the agent.
    fn count(
        &self,
        agent_id: &AgentId,
    ) -> impl std::future::Future<Output = Result<u64, MemoryError>> + Send;
}
