//! Turn engine.
//!
//! Runs a round-robin conversation: for each turn it builds the speaker's
//! context window, dispatches it through the [`BackendAdapter`], sanitizes
//! the reply, appends it to the speaker's memory, and records it in the
//! transcript. Backend and configuration failures are contained per turn and
//! become error notices; storage and reference failures abort the run.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use colloquy_types::agent::Agent;
use colloquy_types::config::GlobalConfig;
use colloquy_types::conversation::{ConversationTurn, Transcript};
use colloquy_types::error::{ConversationError, GenerateError};
use colloquy_types::llm::{BackendKind, BackendSelection};
use colloquy_types::memory::Role;

use crate::llm::adapter::BackendAdapter;
use crate::repository::memory::MemoryRepository;
use crate::sanitize::sanitize;

use super::context::ContextWindow;
use super::prompt::turn_prompt;

/// Bounds applied to every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Most recent own utterances replayed to the speaker.
    pub history_limit: u32,
    pub max_reply_words: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_limit: 20,
            max_reply_words: 20,
        }
    }
}

impl From<&GlobalConfig> for EngineSettings {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            max_reply_words: config.max_reply_words,
        }
    }
}

/// Input to one conversation run.
#[derive(Debug, Clone)]
pub struct ConversationRequest {
    /// Speaking order. Already resolved from the persona registry.
    pub agents: Vec<Agent>,
    pub initial_prompt: String,
    pub turns: u32,
    pub backend: BackendSelection,
}

impl ConversationRequest {
    /// Reject an empty cast, a repeated agent, or zero turns. `run` calls
    /// this before any work.
    ///
    /// Round-robin over a list that names someone twice would let them speak
    /// twice in a row (`A,A,B`, or `A,B,A` at the wrap), so every agent may
    /// appear once.
    pub fn validate(&self) -> Result<(), ConversationError> {
        if self.agents.is_empty() {
            return Err(ConversationError::InvalidRequest(
                "at least one agent is required".to_string(),
            ));
        }
        for (i, agent) in self.agents.iter().enumerate() {
            if self.agents[..i].iter().any(|a| a.id == agent.id) {
                return Err(ConversationError::InvalidRequest(format!(
                    "agent '{}' is listed more than once",
                    agent.name
                )));
            }
        }
        if self.turns == 0 {
            return Err(ConversationError::InvalidRequest(
                "turns must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where a turn is in its cycle. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingTurn,
    BuildingContext,
    Dispatching,
    Failed,
    Sanitizing,
    Persisting,
    Done,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::AwaitingTurn => "awaiting_turn",
            TurnState::BuildingContext => "building_context",
            TurnState::Dispatching => "dispatching",
            TurnState::Failed => "failed",
            TurnState::Sanitizing => "sanitizing",
            TurnState::Persisting => "persisting",
            TurnState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of dispatching one turn.
///
/// A failed dispatch still produces text: the notice is sanitized, persisted
/// and shown like any other utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Spoke(String),
    Failed { notice: String },
}

impl TurnOutcome {
    fn from_dispatch(
        result: Result<String, GenerateError>,
        speaker: &Agent,
        backend: BackendKind,
    ) -> Self {
        match result {
            Ok(raw) => TurnOutcome::Spoke(raw),
            Err(err) => {
                let cause = match &err {
                    GenerateError::Configuration(e) => e.to_string(),
                    GenerateError::Backend(e) => e.cause.to_string(),
                };
                TurnOutcome::Failed {
                    notice: format!(
                        "Error generating response for {} with {} backend: {}",
                        speaker.name, backend, cause
                    ),
                }
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Spoke(text) => text,
            TurnOutcome::Failed { notice } => notice,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TurnOutcome::Failed { .. })
    }
}

/// Orchestrates turn-based conversations between agents.
///
/// Generic over the memory store and backend adapter so colloquy-core never
/// depends on colloquy-infra. Holds no per-conversation state; one engine
/// can run any number of conversations concurrently.
pub struct TurnEngine<M: MemoryRepository, B: BackendAdapter> {
    memory: M,
    backend: B,
    settings: EngineSettings,
}

impl<M: MemoryRepository, B: BackendAdapter> TurnEngine<M, B> {
    pub fn new(memory: M, backend: B, settings: EngineSettings) -> Self {
        Self {
            memory,
            backend,
            settings,
        }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Run a conversation to completion or cancellation.
    pub async fn run(
        &self,
        request: &ConversationRequest,
        cancel: &CancellationToken,
    ) -> Result<Transcript, ConversationError> {
        self.run_with(request, cancel, |_| {}).await
    }

    /// Run a conversation, calling `on_turn` after each turn is persisted.
    ///
    /// The token is checked before every turn. A turn already dispatched
    /// always finishes and is persisted.
    pub async fn run_with<F>(
        &self,
        request: &ConversationRequest,
        cancel: &CancellationToken,
        mut on_turn: F,
    ) -> Result<Transcript, ConversationError>
    where
        F: FnMut(&ConversationTurn) + Send,
    {
        request.validate()?;

        let names: Vec<&str> = request.agents.iter().map(|a| a.name.as_str()).collect();
        info!(
            agents = ?names,
            turns = request.turns,
            backend = %request.backend.kind,
            model = %request.backend.config.model,
            "conversation started"
        );

        let mut transcript = Transcript::default();
        for index in 0..request.turns {
            if cancel.is_cancelled() {
                info!(completed = transcript.len(), "conversation cancelled");
                transcript.cancelled = true;
                break;
            }

            let speaker = &request.agents[index as usize % request.agents.len()];
            let prompt = turn_prompt(&request.initial_prompt, transcript.last(), speaker);

            let span = info_span!(
                "conversation.turn",
                turn = index,
                gen_ai.agent.id = %speaker.id,
                gen_ai.agent.name = %speaker.name,
                gen_ai.provider.name = %request.backend.kind,
                gen_ai.request.model = %request.backend.config.model,
            );
            let turn = self
                .take_turn(index, speaker, request, &prompt)
                .instrument(span)
                .await?;

            on_turn(&turn);
            transcript.turns.push(turn);
        }

        info!(
            turns = transcript.len(),
            failed = transcript.failed_turns(),
            cancelled = transcript.cancelled,
            "conversation finished"
        );
        Ok(transcript)
    }

    async fn take_turn(
        &self,
        index: u32,
        speaker: &Agent,
        request: &ConversationRequest,
        prompt: &str,
    ) -> Result<ConversationTurn, ConversationError> {
        enter(TurnState::AwaitingTurn);

        enter(TurnState::BuildingContext);
        let prior = self
            .memory
            .read_tail(
                &speaker.id,
                Some(self.settings.history_limit),
                Some(Role::Assistant),
            )
            .await?;
        let window = ContextWindow::build(
            speaker,
            &request.agents,
            &prior,
            prompt,
            self.settings.max_reply_words,
        );

        enter(TurnState::Dispatching);
        let kind = request.backend.kind;
        let result = self
            .backend
            .generate(
                &window.system_prompt,
                &window.history,
                kind,
                &request.backend.config,
            )
            .await;
        let outcome = TurnOutcome::from_dispatch(result, speaker, kind);
        if let TurnOutcome::Failed { notice } = &outcome {
            enter(TurnState::Failed);
            warn!(error = %notice, "turn dispatch failed");
        }

        enter(TurnState::Sanitizing);
        let utterance = sanitize(outcome.text());

        enter(TurnState::Persisting);
        self.memory
            .append(&speaker.id, Role::Assistant, &utterance)
            .await?;

        enter(TurnState::Done);
        Ok(ConversationTurn {
            index,
            speaker_id: speaker.id,
            speaker: speaker.name.clone(),
            utterance,
            failed: outcome.is_failed(),
        })
    }
}

fn enter(state: TurnState) {
    debug!(state = %state, "turn state");
}
