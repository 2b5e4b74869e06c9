//! System and per-turn prompt builders.
//!
//! The system prompt uses XML-style tags for section boundaries so the model
//! can tell its own persona apart from the other participants:
//!
//! ```text
//! <persona>You are {name}, defined as: {persona}</persona>
//! <participants>- {other}: {persona}</participants>
//! <instructions>Speak only as yourself...</instructions>
//! ```

use colloquy_types::agent::Agent;
use colloquy_types::conversation::ConversationTurn;

/// Builds the leading system entry for one speaker.
pub struct SystemPromptBuilder;

impl SystemPromptBuilder {
    /// Assemble the system prompt for `speaker`.
    ///
    /// `participants` is the full ordered agent list of the conversation; every
    /// entry except the speaker is listed as another character.
    pub fn build(speaker: &Agent, participants: &[Agent], max_reply_words: u32) -> String {
        let mut sections = Vec::with_capacity(3);

        sections.push(format!(
            "<persona>\nYou are {}, defined as: {}\n</persona>",
            speaker.name,
            speaker.persona.trim()
        ));

        let others: Vec<String> = participants
            .iter()
            .filter(|agent| agent.id != speaker.id)
            .map(|agent| format!("- {}: {}", agent.name, agent.persona.trim()))
            .collect();
        if !others.is_empty() {
            sections.push(format!(
                "<participants>\nOther characters in this scene:\n{}\n</participants>",
                others.join("\n")
            ));
        }

        sections.push(format!(
            "<instructions>\n\
             Speak only as {name}. Never speak for other characters.\n\
             Do not include or repeat the other characters' lines in your response.\n\
             Stay fully in character and never copy others' speech patterns.\n\
             Use simple punctuation without em dashes or asterisks.\n\
             Use at most {max_reply_words} words.\n\
             </instructions>",
            name = speaker.name,
        ));

        sections.join("\n\n")
    }
}

/// The user entry for a turn.
///
/// The first turn gets `initial_prompt` verbatim. Every later turn only
/// references the turn immediately before it.
pub fn turn_prompt(
    initial_prompt: &str,
    previous: Option<&ConversationTurn>,
    current: &Agent,
) -> String {
    match previous {
        None => initial_prompt.to_string(),
        Some(prev) => format!(
            "{} said: '{}'. Respond as {}.",
            prev.speaker, prev.utterance, current.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast() -> Vec<Agent> {
        vec![
            Agent::new("Alice", "A witty merchant."),
            Agent::new("Bob", "A gruff blacksmith."),
            Agent::new("Charlie", "A dramatic bard."),
        ]
    }

    #[test]
    fn test_system_prompt_contains_speaker_and_others() {
        let agents = cast();
        let prompt = SystemPromptBuilder::build(&agents[1], &agents, 20);

        assert!(prompt.contains("You are Bob, defined as: A gruff blacksmith."));
        assert!(prompt.contains("- Alice: A witty merchant."));
        assert!(prompt.contains("- Charlie: A dramatic bard."));
        assert!(!prompt.contains("- Bob:"));
        assert!(prompt.contains("Use at most 20 words."));
        assert!(prompt.contains("Never speak for other characters."));
        assert!(prompt.contains("without em dashes or asterisks"));
    }

    #[test]
    fn test_system_prompt_single_agent_has_no_participants() {
        let agents = vec![Agent::new("Solo", "Alone on stage.")];
        let prompt = SystemPromptBuilder::build(&agents[0], &agents, 5);
        assert!(!prompt.contains("<participants>"));
        assert!(prompt.contains("Use at most 5 words."));
    }

    #[test]
    fn test_first_turn_uses_initial_prompt_verbatim() {
        let agents = cast();
        let prompt = turn_prompt("  A traveler arrives.\n", None, &agents[0]);
        assert_eq!(prompt, "  A traveler arrives.\n");
    }

    #[test]
    fn test_later_turn_references_previous_only() {
        let agents = cast();
        let prev = ConversationTurn {
            index: 3,
            speaker_id: agents[0].id,
            speaker: "Alice".to_string(),
            utterance: "Gold, you say?".to_string(),
            failed: false,
        };
        let prompt = turn_prompt("ignored", Some(&prev), &agents[1]);
        assert_eq!(prompt, "Alice said: 'Gold, you say?'. Respond as Bob.");
    }
}
