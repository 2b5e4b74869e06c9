//! `colloquy ask`: one stateless prompt, no persona, no memory.

use anyhow::Result;
use console::style;

use colloquy_core::llm::adapter::BackendAdapter;
use colloquy_core::sanitize::sanitize;
use colloquy_types::llm::ChatMessage;

use crate::state::AppState;

/// Send `prompt` to a backend and print the sanitized reply.
///
/// # Examples
///
/// ```bash
/// colloquy ask "Name three famous blacksmiths."
/// colloquy ask --backend openai "Summarize the plot of Beowulf."
/// ```
pub async fn ask(state: &AppState, prompt: &str, backend: Option<&str>, json: bool) -> Result<()> {
    anyhow::ensure!(!prompt.trim().is_empty(), "prompt cannot be empty");
    let selection = state.config.select_backend(backend)?;

    let raw = state
        .engine
        .backend()
        .generate(
            "",
            &[ChatMessage::user(prompt)],
            selection.kind,
            &selection.config,
        )
        .await?;
    let reply = sanitize(&raw);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "response": reply,
                "backend": selection.kind,
                "model": selection.config.model,
            })
        );
    } else {
        println!();
        println!("  {}", reply);
        println!();
        println!(
            "  {}",
            style(format!("{} · {}", selection.kind, selection.config.model)).dim()
        );
        println!();
    }

    Ok(())
}
