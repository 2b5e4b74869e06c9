//! Agent CLI commands: create, list, show, import, seed.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use colloquy_core::persona::default_personas;
use colloquy_core::repository::memory::MemoryRepository;
use colloquy_types::agent::{Agent, AgentSeed};

use crate::state::AppState;

/// Declare one agent.
///
/// # Examples
///
/// ```bash
/// colloquy agent create Bob "You are Bob, a gruff but loyal blacksmith."
/// ```
pub async fn create_agent(state: &AppState, name: &str, persona: &str, json: bool) -> Result<()> {
    let agent = state.registry.declare(name, persona).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agent)?);
        return Ok(());
    }

    println!();
    if agent.persona != persona.trim() {
        println!(
            "  {} '{}' already exists; its persona was kept.",
            style("i").blue().bold(),
            style(&agent.name).cyan()
        );
    } else {
        println!(
            "  {} Agent '{}' ready.",
            style("✓").green().bold(),
            style(&agent.name).cyan()
        );
    }
    println!("  {}  {}", style("ID:").bold(), style(agent.id.to_string()).dim());
    println!();

    Ok(())
}

/// List all agents in a table.
pub async fn list_agents(state: &AppState, json: bool) -> Result<()> {
    let agents = state.registry.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agents)?);
        return Ok(());
    }

    if agents.is_empty() {
        println!();
        println!(
            "  {} No agents yet. Add the demo cast with: {}",
            style("i").blue().bold(),
            style("colloquy agent seed").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Persona").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Last Active").fg(Color::White),
    ]);

    for agent in &agents {
        let count = state.engine.memory().count(&agent.id).await?;
        let last_active = match &agent.last_active_at {
            Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            None => "never".to_string(),
        };
        table.add_row(vec![
            Cell::new(&agent.name).fg(Color::Cyan),
            Cell::new(truncate(&agent.persona, 60)),
            Cell::new(count).fg(Color::Yellow),
            Cell::new(last_active).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} agent{}",
        style(agents.len()).bold(),
        if agents.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one agent's full persona.
pub async fn show_agent(state: &AppState, name: &str, json: bool) -> Result<()> {
    let agent = state
        .registry
        .get_by_name(name)
        .await
        .with_context(|| format!("Agent '{name}' not found"))?;
    let count = state.engine.memory().count(&agent.id).await?;

    if json {
        let mut value = serde_json::to_value(&agent)?;
        value["message_count"] = count.into();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&agent.name).cyan().bold());
    println!("  {}  {}", style("ID:").bold(), style(agent.id.to_string()).dim());
    println!(
        "  {}  {}",
        style("Created:").bold(),
        agent.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("  {}  {count}", style("Messages:").bold());
    println!();
    println!("  {}", agent.persona);
    println!();

    Ok(())
}

/// Declare every agent listed in a JSON file.
///
/// # Examples
///
/// ```bash
/// colloquy agent import agents.json
/// ```
pub async fn import_agents(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let seeds: Vec<AgentSeed> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON list of {{name, persona}}", file.display()))?;

    let agents = state.registry.import(&seeds).await?;
    report_declared(&agents, json)
}

/// Declare the built-in demo personas.
pub async fn seed_agents(state: &AppState, json: bool) -> Result<()> {
    let agents = state.registry.import(&default_personas()).await?;
    report_declared(&agents, json)
}

fn report_declared(agents: &[Agent], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(agents)?);
        return Ok(());
    }

    println!();
    for agent in agents {
        println!("  {} {}", style("✓").green(), style(&agent.name).cyan());
    }
    println!();
    println!(
        "  {} agent{} declared",
        style(agents.len()).bold(),
        if agents.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("nyaaaaaa~ \u{1F431}\u{1F431}", 8), "nyaaa...");
    }

    #[tokio::test]
    async fn test_seed_then_import_is_idempotent() {
        let state = test_state().await;
        seed_agents(&state, true).await.unwrap();
        seed_agents(&state, true).await.unwrap();
        let names: Vec<String> = state
            .registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie", "Neko-Chan"]);
    }

    #[tokio::test]
    async fn test_import_from_file() {
        let state = test_state().await;
        let path = state.data_dir.join("agents.json");
        std::fs::write(
            &path,
            r#"[{"name": "Dora", "persona": "A wandering cartographer."}]"#,
        )
        .unwrap();

        import_agents(&state, &path, true).await.unwrap();
        let dora = state.registry.get_by_name("Dora").await.unwrap();
        assert_eq!(dora.persona, "A wandering cartographer.");
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_file() {
        let state = test_state().await;
        let path = state.data_dir.join("broken.json");
        std::fs::write(&path, r#"{"name": "Dora"}"#).unwrap();
        assert!(import_agents(&state, &path, true).await.is_err());
    }
}
