use chrono::{Duration, Utc};
use focus_core::{Session, SessionStatus};

use crate::commands::common::{
    format_session_lines, format_sync_status, parse_timestamp, Workspace,
};
use crate::error::CliError;

pub struct NewSession {
    pub task_id: String,
    pub title: String,
    pub minutes: u32,
    pub started_at: Option<String>,
    pub status: SessionStatus,
    pub note: Option<String>,
}

/// Save a session ending now, newest first, within the history limit.
pub async fn record_session(workspace: &Workspace, input: NewSession) -> Result<Session, CliError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(CliError::InvalidArgument(
            "session title cannot be empty".to_string(),
        ));
    }
    if input.minutes == 0 {
        return Err(CliError::InvalidArgument(
            "planned minutes must be at least 1".to_string(),
        ));
    }

    let ended_at = Utc::now();
    let started_at = match input.started_at.as_deref() {
        Some(value) => parse_timestamp(value)?,
        None => ended_at - Duration::minutes(i64::from(input.minutes)),
    };

    let session = Session::new(
        input.task_id.trim(),
        title,
        input.minutes,
        started_at,
        ended_at,
        input.status,
        input.note,
    );
    workspace
        .local
        .record_session(session.clone(), workspace.settings.history_limit)
        .await;
    Ok(session)
}

pub async fn run_session_add(
    workspace: &Workspace,
    input: NewSession,
    no_sync: bool,
) -> Result<(), CliError> {
    let session = record_session(workspace, input).await?;
    println!("{}", session.id);

    if let Some(status) = workspace.auto_sync(no_sync).await {
        eprintln!("Sync: {}", format_sync_status(&status));
    }
    Ok(())
}

pub async fn run_session_list(
    workspace: &Workspace,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let sessions: Vec<Session> = workspace
        .local
        .sessions()
        .await
        .into_iter()
        .take(limit)
        .collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }

    for line in format_session_lines(&sessions, Utc::now().timestamp_millis()) {
        println!("{line}");
    }
    Ok(())
}
