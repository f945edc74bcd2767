//! Focus CLI - record focus sessions and interruptions from the terminal
//!
//! Records land in the local store first; a short debounced push mirrors
//! them to Supabase when a profile is signed in.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, InterruptCommands, SessionCommands, SyncCommands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::backup::{run_export, run_import};
use crate::commands::common::Workspace;
use crate::commands::config::run_config;
use crate::commands::interrupt::{run_interrupt_add, run_interrupt_list};
use crate::commands::session::{run_session_add, run_session_list, NewSession};
use crate::commands::stats::run_stats;
use crate::commands::sync::{run_sync_pull, run_sync_push, run_sync_remote, run_sync_status};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("focus_cli=info,focus_core=info")),
        )
        .init();

    let Cli {
        command,
        data_path,
        profile,
    } = Cli::parse();
    let profile = profile.as_deref();

    match command {
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => run_auth(command, profile).await?,
        Commands::Session { command } => {
            let workspace = Workspace::open(data_path, profile).await?;
            run_session(&workspace, command).await?;
        }
        Commands::Interrupt { command } => {
            let workspace = Workspace::open(data_path, profile).await?;
            run_interrupt(&workspace, command).await?;
        }
        Commands::Stats { json } => {
            let workspace = Workspace::open(data_path, profile).await?;
            run_stats(&workspace, json).await?;
        }
        Commands::Sync { command } => {
            let workspace = Workspace::open(data_path, profile).await?;
            run_sync(&workspace, command).await?;
        }
        Commands::Export { output } => {
            let workspace = Workspace::open(data_path, profile).await?;
            run_export(&workspace, output.as_deref()).await?;
        }
        Commands::Import { path, yes } => {
            let workspace = Workspace::open(data_path, profile).await?;
            run_import(&workspace, &path, yes).await?;
        }
    }

    Ok(())
}

async fn run_session(workspace: &Workspace, command: SessionCommands) -> Result<(), CliError> {
    match command {
        SessionCommands::Add {
            task_id,
            title,
            minutes,
            started_at,
            status,
            note,
            no_sync,
        } => {
            let input = NewSession {
                task_id,
                title,
                minutes,
                started_at,
                status: status.into(),
                note,
            };
            run_session_add(workspace, input, no_sync).await?;
        }
        SessionCommands::List { limit, json } => run_session_list(workspace, limit, json).await?,
    }
    Ok(())
}

async fn run_interrupt(workspace: &Workspace, command: InterruptCommands) -> Result<(), CliError> {
    match command {
        InterruptCommands::Add {
            trigger,
            cooldown_done,
            outcome,
            no_sync,
        } => {
            run_interrupt_add(workspace, trigger, cooldown_done, outcome.into(), no_sync).await?;
        }
        InterruptCommands::List { limit, json } => {
            run_interrupt_list(workspace, limit, json).await?;
        }
    }
    Ok(())
}

async fn run_sync(workspace: &Workspace, command: SyncCommands) -> Result<(), CliError> {
    match command {
        SyncCommands::Push => {
            run_sync_push(workspace).await?;
        }
        SyncCommands::Pull { overwrite, yes } => {
            run_sync_pull(workspace, overwrite, yes).await?;
        }
        SyncCommands::Status { json } => run_sync_status(workspace, json).await?,
        SyncCommands::Remote => {
            run_sync_remote(workspace).await?;
        }
    }
    Ok(())
}
