//! Persona registry.
//!
//! The registry is the single owner of agent definitions. It is passed
//! explicitly to whoever needs it; nothing resolves agents through global
//! state.

mod defaults;

pub use defaults::{DEFAULT_OPENING, default_personas};

use tracing::{debug, info};

use colloquy_types::agent::{Agent, AgentId, AgentSeed};
use colloquy_types::error::{ReferenceError, RegistryError};

use crate::repository::agent::AgentRepository;

/// Declares and looks up agents.
///
/// Generic over the repository so colloquy-core never depends on
/// colloquy-infra.
pub struct PersonaRegistry<R: AgentRepository> {
    repo: R,
}

impl<R: AgentRepository> PersonaRegistry<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Declare an agent. Idempotent by name.
    ///
    /// If an agent with the trimmed name already exists it is returned as is
    /// and `persona` is ignored.
    pub async fn declare(&self, name: &str, persona: &str) -> Result<Agent, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidAgent(
                "name cannot be empty".to_string(),
            ));
        }
        let persona = persona.trim();
        if persona.is_empty() {
            return Err(RegistryError::InvalidAgent(format!(
                "persona for '{name}' cannot be empty"
            )));
        }

        let agent = self.repo.insert_if_absent(&Agent::new(name, persona)).await?;
        debug!(agent = %agent.name, id = %agent.id, "agent declared");
        Ok(agent)
    }

    pub async fn get(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ReferenceError::UnknownAgent(*id).into())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Agent, RegistryError> {
        self.repo
            .get_by_name(name.trim())
            .await?
            .ok_or_else(|| ReferenceError::UnknownAgentName(name.trim().to_string()).into())
    }

    /// All agents, ordered by name.
    pub async fn list(&self) -> Result<Vec<Agent>, RegistryError> {
        Ok(self.repo.list().await?)
    }

    /// Look up each name in order. Fails on the first unknown name.
    pub async fn resolve(&self, names: &[String]) -> Result<Vec<Agent>, RegistryError> {
        let mut agents = Vec::with_capacity(names.len());
        for name in names {
            agents.push(self.get_by_name(name).await?);
        }
        Ok(agents)
    }

    /// Declare every seed in order and return the stored agents.
    pub async fn import(&self, seeds: &[AgentSeed]) -> Result<Vec<Agent>, RegistryError> {
        let mut agents = Vec::with_capacity(seeds.len());
        for seed in seeds {
            agents.push(self.declare(&seed.name, &seed.persona).await?);
        }
        info!(count = agents.len(), "imported agents");
        Ok(agents)
    }
}
