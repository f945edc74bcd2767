use chrono::Utc;
use focus_core::{Interrupt, InterruptOutcome};

use crate::commands::common::{format_interrupt_lines, format_sync_status, Workspace};
use crate::error::CliError;

pub async fn record_interrupt(
    workspace: &Workspace,
    trigger: Option<String>,
    cooldown_done: bool,
    outcome: InterruptOutcome,
) -> Interrupt {
    let interrupt = Interrupt::new(Utc::now(), trigger, cooldown_done, outcome);
    workspace
        .local
        .record_interrupt(interrupt.clone(), workspace.settings.history_limit)
        .await;
    interrupt
}

pub async fn run_interrupt_add(
    workspace: &Workspace,
    trigger: Option<String>,
    cooldown_done: bool,
    outcome: InterruptOutcome,
    no_sync: bool,
) -> Result<(), CliError> {
    let interrupt = record_interrupt(workspace, trigger, cooldown_done, outcome).await;
    println!("{}", interrupt.id);

    if let Some(status) = workspace.auto_sync(no_sync).await {
        eprintln!("Sync: {}", format_sync_status(&status));
    }
    Ok(())
}

pub async fn run_interrupt_list(
    workspace: &Workspace,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let interrupts: Vec<Interrupt> = workspace
        .local
        .interrupts()
        .await
        .into_iter()
        .take(limit)
        .collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&interrupts)?);
        return Ok(());
    }

    if interrupts.is_empty() {
        println!("No interruptions recorded.");
        return Ok(());
    }

    for line in format_interrupt_lines(&interrupts, Utc::now().timestamp_millis()) {
        println!("{line}");
    }
    Ok(())
}
