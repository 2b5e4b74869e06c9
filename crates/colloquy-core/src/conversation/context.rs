//! Per-turn context window.
//!
//! A context window is the bounded set of messages sent to a backend for
//! one turn: one system entry, the speaker's own recent utterances, and
//! exactly one user entry.

use colloquy_types::agent::Agent;
use colloquy_types::llm::ChatMessage;
use colloquy_types::memory::MemoryMessage;

use super::prompt::SystemPromptBuilder;

/// Everything a backend sees for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub system_prompt: String,
    /// Prior utterances as assistant entries, oldest first, then the user prompt.
    pub history: Vec<ChatMessage>,
}

impl ContextWindow {
    /// Build the window from already-bounded prior utterances.
    ///
    /// `prior` must be in ascending chronological order.
    pub fn build(
        speaker: &Agent,
        participants: &[Agent],
        prior: &[MemoryMessage],
        prompt: &str,
        max_reply_words: u32,
    ) -> Self {
        let system_prompt = SystemPromptBuilder::build(speaker, participants, max_reply_words);

        let mut history = Vec::with_capacity(prior.len() + 1);
        history.extend(prior.iter().map(|m| ChatMessage::assistant(m.content.clone())));
        history.push(ChatMessage::user(prompt));

        Self {
            system_prompt,
            history,
        }
    }
}
