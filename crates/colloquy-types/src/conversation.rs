//! Conversation transcript types.
//!
//! A transcript is the ordered, in-memory record of one conversation run.
//! It is never persisted as such; each turn's utterance lives on in the
//! speaker's memory log.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::agent::AgentId;

/// One agent's single generation-and-persist cycle, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Zero-based turn index.
    pub index: u32,
    pub speaker_id: AgentId,
    /// Speaker display name.
    pub speaker: String,
    pub utterance: String,
    /// True when the utterance is a synthesized backend error notice.
    #[serde(default)]
    pub failed: bool,
}

/// Ordered output of a conversation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub turns: Vec<ConversationTurn>,
    /// Set when cancellation stopped scheduling before all turns ran.
    #[serde(default)]
    pub cancelled: bool,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Number of turns that ended in a synthesized error notice.
    pub fn failed_turns(&self) -> usize {
        self.turns.iter().filter(|t| t.failed).count()
    }
}

/// Lifecycle status of a conversation running behind the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationStatus::Running => write!(f, "running"),
            ConversationStatus::Completed => write!(f, "completed"),
            ConversationStatus::Cancelled => write!(f, "cancelled"),
            ConversationStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(ConversationStatus::Running),
            "completed" => Ok(ConversationStatus::Completed),
            "cancelled" => Ok(ConversationStatus::Cancelled),
            "failed" => Ok(ConversationStatus::Failed),
            other => Err(format!("invalid conversation status: '{other}'")),
        }
    }
}
