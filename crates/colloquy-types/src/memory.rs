//! Per-agent memory log types.
//!
//! Every utterance an agent produces (including synthesized error notices)
//! is appended to that agent's memory. The log is append-only; ordering by
//! `created_at` is the only sequencing authority.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::agent::AgentId;

/// Role of a stored memory message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('system', 'user', 'assistant', 'gm'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Game-master narration injected from outside the conversation.
    Gm,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Gm => write!(f, "gm"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "gm" => Ok(Role::Gm),
            other => Err(format!("invalid memory role: '{other}'")),
        }
    }
}

/// A single persisted message in an agent's memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMessage {
    /// Store-assigned row id.
    pub id: i64,
    pub agent_id: AgentId,
    pub role: Role,
    pub content: String,
    /// Strictly increasing per agent.
    pub created_at: DateTime<Utc>,
}
