//! Agent (persona) identity types.
//!
//! An agent is a named participant with a fixed persona description that is
//! sent to the model as its system prompt. Agents are unique by name and
//! immutable once declared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for an agent, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new AgentId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create an AgentId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A conversation participant.
///
/// The persona is the full descriptive prompt for the character
/// ("You are Bob, a gruff but deeply loyal blacksmith...").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Display name, unique across the registry.
    pub name: String,
    /// Persona description used to build the agent's system prompt.
    pub persona: String,
    pub created_at: DateTime<Utc>,
    /// Last time this agent spoke in a conversation.
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Agent {
    /// Build a fresh agent record with a new id.
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            persona: persona.into(),
            created_at: Utc::now(),
            last_active_at: None,
        }
    }
}

/// Name/persona pair used to declare agents in bulk (e.g. from `agents.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSeed {
    pub name: String,
    pub persona: String,
}

/// Request body for declaring an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclareAgentRequest {
    pub name: String,
    pub persona: String,
}
