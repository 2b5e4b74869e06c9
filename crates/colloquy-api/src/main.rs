//! Colloquy CLI and REST API entry point.
//!
//! Binary name: `colloquy`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to the appropriate command handler or starts the REST
//! API server.

mod cli;
mod http;
mod jobs;
mod state;
#[cfg(test)]
mod testing;

use clap::Parser;
use clap_complete::generate;

use cli::{AgentCommand, Cli, Commands, MemoryCommand};
use colloquy_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "colloquy", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli::log_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    tracing::debug!(
        data_dir = %state.data_dir.display(),
        default_backend = %state.config.default_backend,
        "state initialized"
    );

    match cli.command {
        Commands::Agent { action } => match action {
            AgentCommand::Create { name, persona } => {
                cli::agent::create_agent(&state, &name, &persona, cli.json).await?;
            }
            AgentCommand::List => {
                cli::agent::list_agents(&state, cli.json).await?;
            }
            AgentCommand::Show { name } => {
                cli::agent::show_agent(&state, &name, cli.json).await?;
            }
            AgentCommand::Import { file } => {
                cli::agent::import_agents(&state, &file, cli.json).await?;
            }
            AgentCommand::Seed => {
                cli::agent::seed_agents(&state, cli.json).await?;
            }
        },

        Commands::Converse {
            agents,
            turns,
            backend,
            prompt,
        } => {
            cli::conversation::converse(
                &state,
                &agents,
                turns,
                backend.as_deref(),
                prompt,
                cli.json,
            )
            .await?;
        }

        Commands::Memory { action } => match action {
            MemoryCommand::Show { name, limit, role } => {
                cli::memory::show_memory(&state, &name, limit, role.as_deref(), cli.json).await?;
            }
            MemoryCommand::Clear { name, force } => {
                cli::memory::clear_memory(&state, &name, force, cli.json).await?;
            }
        },

        Commands::Ask { backend, prompt } => {
            cli::ask::ask(&state, &prompt, backend.as_deref(), cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Colloquy API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let jobs = state.conversations.clone();
            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            jobs.cancel_all();
            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
