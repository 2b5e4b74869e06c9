//! In-memory repositories and a scripted backend shared by core tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{Duration, Utc};

use colloquy_types::agent::{Agent, AgentId};
use colloquy_types::error::{
    BackendError, ConfigurationError, GenerateError, MemoryError, ReferenceError, RepositoryError,
};
use colloquy_types::llm::{BackendConfig, BackendKind, ChatMessage, LlmError};
use colloquy_types::memory::{MemoryMessage, Role};

use crate::llm::adapter::BackendAdapter;
use crate::repository::agent::AgentRepository;
use crate::repository::memory::MemoryRepository;

#[derive(Default)]
pub struct InMemoryAgentRepository {
    agents: Mutex<Vec<Agent>>,
}

impl AgentRepository for InMemoryAgentRepository {
    async fn insert_if_absent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let mut agents = self.agents.lock().unwrap();
        if let Some(existing) = agents.iter().find(|a| a.name == agent.name) {
            return Ok(existing.clone());
        }
        agents.push(agent.clone());
        Ok(agent.clone())
    }

    async fn get_by_id(&self, id: &AgentId) -> Result<Option<Agent>, RepositoryError> {
        let agents = self.agents.lock().unwrap();
        Ok(agents.iter().find(|a| a.id == *id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Agent>, RepositoryError> {
        let agents = self.agents.lock().unwrap();
        Ok(agents.iter().find(|a| a.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<Agent>, RepositoryError> {
        let mut agents = self.agents.lock().unwrap().clone();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agents)
    }
}

/// Memory log keyed by agent. Agents must be registered before appends.
#[derive(Default)]
pub struct InMemoryMemoryRepository {
    known: Mutex<Vec<AgentId>>,
    messages: Mutex<Vec<MemoryMessage>>,
    fail_appends: Mutex<bool>,
}

impl InMemoryMemoryRepository {
    pub fn with_agents(agents: &[Agent]) -> Self {
        let repo = Self::default();
        repo.known.lock().unwrap().extend(agents.iter().map(|a| a.id));
        repo
    }

    pub fn fail_appends(&self) {
        *self.fail_appends.lock().unwrap() = true;
    }

    pub fn contents(&self, agent_id: &AgentId) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.agent_id == *agent_id)
            .map(|m| m.content.clone())
            .collect()
    }
}

impl MemoryRepository for InMemoryMemoryRepository {
    async fn append(
        &self,
        agent_id: &AgentId,
        role: Role,
        content: &str,
    ) -> Result<MemoryMessage, MemoryError> {
        if *self.fail_appends.lock().unwrap() {
            return Err(RepositoryError::Query("disk I/O error".to_string()).into());
        }
        if !self.known.lock().unwrap().contains(agent_id) {
            return Err(ReferenceError::UnknownAgent(*agent_id).into());
        }
        let mut messages = self.messages.lock().unwrap();
        let last = messages
            .iter()
            .filter(|m| m.agent_id == *agent_id)
            .map(|m| m.created_at)
            .max();
        let now = Utc::now();
        let created_at = match last {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };
        let message = MemoryMessage {
            id: messages.len() as i64 + 1,
            agent_id: *agent_id,
            role,
            content: content.to_string(),
            created_at,
        };
        messages.push(message.clone());
        Ok(message)
    }

    async fn read_tail(
        &self,
        agent_id: &AgentId,
        limit: Option<u32>,
        role: Option<Role>,
    ) -> Result<Vec<MemoryMessage>, MemoryError> {
        let messages = self.messages.lock().unwrap();
        let matching: Vec<MemoryMessage> = messages
            .iter()
            .filter(|m| m.agent_id == *agent_id && role.is_none_or(|r| m.role == r))
            .cloned()
            .collect();
        let skip = match limit {
            Some(limit) => matching.len().saturating_sub(limit as usize),
            None => 0,
        };
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn clear(&self, agent_id: &AgentId) -> Result<u64, MemoryError> {
        if !self.known.lock().unwrap().contains(agent_id) {
            return Err(ReferenceError::UnknownAgent(*agent_id).into());
        }
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.agent_id != *agent_id);
        Ok((before - messages.len()) as u64)
    }

    async fn count(&self, agent_id: &AgentId) -> Result<u64, MemoryError> {
        let messages = self.messages.lock().unwrap();
        Ok(messages.iter().filter(|m| m.agent_id == *agent_id).count() as u64)
    }
}

pub enum Scripted {
    Reply(String),
    Fail(String),
    MissingCredential,
}

/// A call the scripted backend received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub kind: BackendKind,
}

/// Backend that answers from a queue and records every request.
///
/// When the queue runs dry it echoes `"reply {n}"`.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl BackendAdapter for ScriptedBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        kind: BackendKind,
        _config: &BackendConfig,
    ) -> Result<String, GenerateError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                history: history.to_vec(),
                kind,
            });
            calls.len()
        };
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => {
                Err(BackendError::new(kind, LlmError::Provider { message }).into())
            }
            Some(Scripted::MissingCredential) => Err(ConfigurationError::MissingCredential {
                backend: kind,
                env_var: "GITHUB_TOKEN".to_string(),
            }
            .into()),
            None => Ok(format!("reply {n}")),
        }
    }
}
