//! Memory CLI commands: show, clear.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use colloquy_core::repository::memory::MemoryRepository;
use colloquy_types::memory::Role;

use crate::state::AppState;

/// Print an agent's memory, oldest first.
///
/// # Examples
///
/// ```bash
/// colloquy memory show Bob --limit 5
/// ```
pub async fn show_memory(
    state: &AppState,
    name: &str,
    limit: Option<u32>,
    role: Option<&str>,
    json: bool,
) -> Result<()> {
    let role = role
        .map(|r| r.parse::<Role>().map_err(anyhow::Error::msg))
        .transpose()?;
    let agent = state
        .registry
        .get_by_name(name)
        .await
        .with_context(|| format!("Agent '{name}' not found"))?;

    let messages = state.engine.memory().read_tail(&agent.id, limit, role).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} '{}' has no memories yet.",
            style("i").blue().bold(),
            style(&agent.name).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("When").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Content").fg(Color::White),
    ]);

    for message in &messages {
        let role_cell = match message.role {
            Role::Assistant => Cell::new("assistant").fg(Color::Cyan),
            Role::User => Cell::new("user").fg(Color::Green),
            Role::System => Cell::new("system").fg(Color::Magenta),
            Role::Gm => Cell::new("gm").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
            role_cell,
            Cell::new(&message.content),
        ]);
    }

    println!();
    println!("  Memory of '{}'", style(&agent.name).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} message{}",
        style(messages.len()).bold(),
        if messages.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Delete an agent's whole memory, asking first unless `force`.
pub async fn clear_memory(state: &AppState, name: &str, force: bool, json: bool) -> Result<()> {
    let agent = state
        .registry
        .get_by_name(name)
        .await
        .with_context(|| format!("Agent '{name}' not found"))?;

    let memory = state.engine.memory();
    let stored = memory.count(&agent.id).await?;

    if stored > 0 && !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Wipe all {} messages for '{}'? This cannot be undone.",
                style(stored).bold(),
                style(&agent.name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let cleared = memory.clear(&agent.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"agent": agent.name, "cleared": cleared})
        );
    } else {
        println!(
            "  {} Cleared {} message{} for '{}'.",
            style("x").red().bold(),
            cleared,
            if cleared == 1 { "" } else { "s" },
            style(&agent.name).cyan()
        );
    }

    Ok(())
}
