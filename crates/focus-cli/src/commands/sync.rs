use focus_core::SyncCounts;
use serde::Serialize;

use crate::commands::common::{confirm, format_sync_status, Workspace};
use crate::error::CliError;

pub async fn run_sync_push(workspace: &Workspace) -> Result<SyncCounts, CliError> {
    let result = workspace.engine()?.push_local().await;
    workspace.observe(&result).await;
    let counts = result?;
    println!(
        "Pushed {} sessions and {} interrupts",
        counts.sessions, counts.interrupts
    );
    Ok(counts)
}

pub async fn run_sync_pull(
    workspace: &Workspace,
    overwrite: bool,
    assume_yes: bool,
) -> Result<SyncCounts, CliError> {
    let engine = workspace.engine()?;

    if !overwrite {
        let result = engine.pull_merge().await;
        workspace.observe(&result).await;
        let counts = result?;
        println!(
            "Merged {} remote sessions and {} remote interrupts",
            counts.sessions, counts.interrupts
        );
        return Ok(counts);
    }

    confirm(
        "Replace all local sessions and interrupts with the remote copy? Local-only records will be lost.",
        assume_yes,
    )?;
    let result = engine.pull_overwrite().await;
    workspace.observe(&result).await;
    let counts = result?;
    println!(
        "Replaced local records with {} remote sessions and {} remote interrupts",
        counts.sessions, counts.interrupts
    );
    Ok(counts)
}

#[derive(Debug, Serialize)]
pub struct SyncStatusReport {
    pub state: &'static str,
    pub at: String,
    pub reason: Option<String>,
    pub local_sessions: usize,
    pub local_interrupts: usize,
    pub remote_configured: bool,
}

pub async fn sync_status_report(workspace: &Workspace) -> SyncStatusReport {
    let status = workspace.local.load_status().await;
    let snapshot = workspace.local.snapshot().await;

    SyncStatusReport {
        state: status.state(),
        at: status.at().to_rfc3339(),
        reason: status.reason().map(str::to_string),
        local_sessions: snapshot.sessions.len(),
        local_interrupts: snapshot.interrupts.len(),
        remote_configured: workspace.engine.is_some(),
    }
}

pub async fn run_sync_status(workspace: &Workspace, as_json: bool) -> Result<(), CliError> {
    if as_json {
        let report = sync_status_report(workspace).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let status = workspace.local.load_status().await;
    let snapshot = workspace.local.snapshot().await;
    println!("Last sync: {}", format_sync_status(&status));
    println!(
        "Local:     {} sessions, {} interrupts",
        snapshot.sessions.len(),
        snapshot.interrupts.len()
    );
    if workspace.engine.is_none() {
        println!("Remote:    not configured");
    }
    Ok(())
}

pub async fn run_sync_remote(workspace: &Workspace) -> Result<SyncCounts, CliError> {
    let counts = workspace.engine()?.remote_counts().await?;
    println!(
        "Remote:    {} sessions, {} interrupts",
        counts.sessions, counts.interrupts
    );
    Ok(counts)
}
