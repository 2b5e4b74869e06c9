//! `colloquy converse`: run a conversation in the foreground.
//!
//! Turns are printed as soon as they are persisted. Ctrl+C stops scheduling
//! new turns; the turn in flight still completes and is saved.

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use colloquy_core::conversation::engine::ConversationRequest;
use colloquy_core::persona::DEFAULT_OPENING;
use colloquy_types::conversation::{ConversationTurn, Transcript};

use crate::state::AppState;

/// Run a conversation between `agents` for `turns` turns.
///
/// # Examples
///
/// ```bash
/// colloquy converse --agents Alice,Bob,Charlie --turns 6
/// colloquy converse -a Bob,Neko-Chan -t 4 -b github_models "The forge is cold."
/// ```
pub async fn converse(
    state: &AppState,
    agents: &[String],
    turns: u32,
    backend: Option<&str>,
    prompt: Option<String>,
    json: bool,
) -> Result<()> {
    let selection = state.config.select_backend(backend)?;
    let agents = state.registry.resolve(agents).await?;
    let request = ConversationRequest {
        agents,
        initial_prompt: prompt.unwrap_or_else(|| DEFAULT_OPENING.to_string()),
        turns,
        backend: selection,
    };
    request.validate()?;

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n  Stopping after the current turn...");
                cancel.cancel();
            }
        })
    };

    if !json {
        print_header(&request);
    }

    let result = state
        .engine
        .run_with(&request, &cancel, |turn| {
            if !json {
                print_turn(turn);
            }
        })
        .await;
    watcher.abort();
    let transcript = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    } else {
        print_summary(&transcript, request.turns);
    }

    Ok(())
}

fn print_header(request: &ConversationRequest) {
    let names: Vec<&str> = request.agents.iter().map(|a| a.name.as_str()).collect();
    println!();
    println!(
        "  {} {} via {} ({})",
        style("Conversation:").bold(),
        style(names.join(", ")).cyan(),
        style(request.backend.kind).yellow(),
        style(&request.backend.config.model).dim()
    );
    println!("  {} {}", style("Prompt:").bold(), request.initial_prompt);
    println!("  {}", style("-".repeat(70)).dim());
}

fn print_turn(turn: &ConversationTurn) {
    let speaker = if turn.failed {
        style(&turn.speaker).red().bold()
    } else {
        style(&turn.speaker).cyan().bold()
    };
    let line = if turn.failed {
        style(turn.utterance.as_str()).red()
    } else {
        style(turn.utterance.as_str())
    };
    println!(
        "  {} {}: {}",
        style(format!("[{}]", turn.index + 1)).dim(),
        speaker,
        line
    );
}

fn print_summary(transcript: &Transcript, requested: u32) {
    println!("  {}", style("-".repeat(70)).dim());
    let failed = transcript.failed_turns();
    let mut summary = format!("{} of {requested} turns", transcript.len());
    if failed > 0 {
        summary.push_str(&format!(", {failed} failed"));
    }
    if transcript.cancelled {
        summary.push_str(", cancelled");
    }
    println!("  {summary}");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;

    #[tokio::test]
    async fn test_converse_unknown_agent_fails_before_running() {
        let state = test_state().await;
        state.registry.declare("Alice", "A merchant.").await.unwrap();
        let err = converse(
            &state,
            &["Alice".to_string(), "Ghost".to_string()],
            2,
            None,
            None,
            true,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[tokio::test]
    async fn test_converse_zero_turns_rejected() {
        let state = test_state().await;
        state.registry.declare("Alice", "A merchant.").await.unwrap();
        let result = converse(&state, &["Alice".to_string()], 0, None, None, true).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_converse_persists_failed_turns() {
        use colloquy_core::repository::memory::MemoryRepository;

        let state = test_state().await;
        let bob = state.registry.declare("Bob", "A blacksmith.").await.unwrap();
        converse(
            &state,
            &["Bob".to_string()],
            2,
            Some("ollama"),
            Some("The forge is cold.".to_string()),
            true,
        )
        .await
        .unwrap();

        let log = state.engine.memory().read_all(&bob.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].content.starts_with("Error generating response for Bob"));
    }
}
