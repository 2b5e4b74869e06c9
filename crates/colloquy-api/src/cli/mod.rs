//! CLI command definitions and dispatch for the `colloquy` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (`colloquy agent create`, `colloquy memory show`), with `converse`,
//! `ask` and `serve` at the top level.

pub mod agent;
pub mod ask;
pub mod conversation;
pub mod memory;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Turn-based conversations between LLM personas.
#[derive(Parser)]
#[command(name = "colloquy", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true, env = "COLLOQUY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage agents (create, list, show, import, seed).
    Agent {
        #[command(subcommand)]
        action: AgentCommand,
    },

    /// Run a conversation between agents.
    Converse {
        /// Comma-separated agent names in speaking order.
        #[arg(long, short, value_delimiter = ',', required = true)]
        agents: Vec<String>,

        /// Number of turns to run.
        #[arg(long, short, default_value = "10")]
        turns: u32,

        /// Backend to use (ollama, openai, github_models). Defaults to config.
        #[arg(long, short)]
        backend: Option<String>,

        /// Opening prompt. Defaults to the traveler scene.
        prompt: Option<String>,
    },

    /// Inspect or wipe agent memory.
    Memory {
        #[command(subcommand)]
        action: MemoryCommand,
    },

    /// Send a single stateless prompt to a backend.
    Ask {
        /// Backend to use. Defaults to config.
        #[arg(long, short)]
        backend: Option<String>,

        /// The prompt text.
        prompt: String,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8081")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Declare an agent. Existing names are left untouched.
    Create {
        /// Agent name (unique).
        name: String,

        /// Persona description used as the agent's system prompt.
        persona: String,
    },

    /// List all agents.
    #[command(alias = "ls")]
    List,

    /// Show an agent's persona and memory size.
    Show {
        /// Agent name.
        name: String,
    },

    /// Declare agents from a JSON file of `[{"name", "persona"}]`.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Declare the built-in demo personas.
    Seed,
}

#[derive(Subcommand)]
pub enum MemoryCommand {
    /// Print an agent's memory, oldest first.
    Show {
        /// Agent name.
        name: String,

        /// Only the most recent N messages.
        #[arg(long, short)]
        limit: Option<u32>,

        /// Only messages with this role (system, user, assistant, gm).
        #[arg(long, short)]
        role: Option<String>,
    },

    /// Delete an agent's whole memory.
    Clear {
        /// Agent name.
        name: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

/// Default log filter for the given verbosity flags.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,colloquy=debug",
        _ => "trace",
    }
}
