use chrono::Local;
use focus_core::stats::FocusMetrics;

use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn compute_metrics(workspace: &Workspace) -> FocusMetrics {
    let snapshot = workspace.local.snapshot().await;
    FocusMetrics::compute(&snapshot.sessions, &snapshot.interrupts, &Local::now())
}

pub fn format_metrics_lines(metrics: &FocusMetrics) -> Vec<String> {
    vec![
        format!(
            "Last 7 days: {} focused of {} attempts",
            metrics.recent_focus, metrics.recent_attempts
        ),
        format!("This week:   {} focus minutes", metrics.week_focus_minutes),
        format!(
            "Interrupts:  {} today, {} this week",
            metrics.today_interrupts, metrics.week_interrupts
        ),
    ]
}

pub async fn run_stats(workspace: &Workspace, as_json: bool) -> Result<(), CliError> {
    let metrics = compute_metrics(workspace).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    for line in format_metrics_lines(&metrics) {
        println!("{line}");
    }
    Ok(())
}
