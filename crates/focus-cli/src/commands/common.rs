use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use focus_core::config::SyncSettings;
use focus_core::remote::PostgrestRemoteStore;
use focus_core::store::LibSqlBlobStore;
use focus_core::{
    AutoSync, Interrupt, LocalStore, ReconcileEngine, Session, SyncStatus, SyncStatusPublisher,
};

use crate::auth::SupabaseAuthService;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub const DATA_PATH_ENV_VAR: &str = "FOCUS_DATA_PATH";

/// Everything a record or sync command needs: the local store, the profile's
/// settings and, when a remote is configured, the reconciliation engine with
/// its auto-sync context.
pub struct Workspace {
    pub local: LocalStore,
    pub settings: SyncSettings,
    pub engine: Option<ReconcileEngine>,
    auto_sync: Option<AutoSync>,
}

impl Workspace {
    pub async fn new(
        local: LocalStore,
        settings: SyncSettings,
        engine: Option<ReconcileEngine>,
    ) -> Self {
        let auto_sync = match &engine {
            Some(engine) => {
                let status = Arc::new(SyncStatusPublisher::load(local.clone()).await);
                Some(AutoSync::new(
                    engine.clone(),
                    status,
                    settings.auto_sync_delay(),
                ))
            }
            None => None,
        };

        Self {
            local,
            settings,
            engine,
            auto_sync,
        }
    }

    pub async fn open(data_path: Option<PathBuf>, profile: Option<&str>) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = config.resolve_profile_name(profile);
        let profile = config.profile(&profile_name).cloned().unwrap_or_default();
        let settings = profile.sync_settings().map_err(CliError::Config)?;

        let local = open_local_store(&resolve_data_path(data_path)?).await?;
        let engine = build_engine(&local, &profile_name, &profile)?;
        if engine.is_some() {
            tracing::debug!("Remote sync enabled via profile '{}'", profile_name);
        }

        Ok(Self::new(local, settings, engine).await)
    }

    pub fn engine(&self) -> Result<&ReconcileEngine, CliError> {
        self.engine.as_ref().ok_or(CliError::SyncNotConfigured)
    }

    /// Run the debounced background push for the current local state and
    /// wait for it, so the process does not exit with a push pending.
    /// Returns `None` when sync is skipped or not configured.
    pub async fn auto_sync(&self, skip: bool) -> Option<SyncStatus> {
        let auto_sync = self.auto_sync.as_ref().filter(|_| !skip)?;

        let snapshot = self.local.snapshot().await;
        auto_sync
            .notify_local_change(&snapshot.sessions, &snapshot.interrupts)
            .await;
        auto_sync.flush().await;
        Some(auto_sync.status().current())
    }

    /// Let the auto-sync context see the outcome of a manual cycle.
    pub async fn observe<T>(&self, result: &focus_core::Result<T>) {
        if let Some(auto_sync) = &self.auto_sync {
            auto_sync.observe(result).await;
        }
    }
}

pub async fn open_local_store(path: &Path) -> Result<LocalStore, CliError> {
    let blobs = LibSqlBlobStore::open(path).await?;
    Ok(LocalStore::new(Arc::new(blobs)))
}

fn build_engine(
    local: &LocalStore,
    profile_name: &str,
    profile: &CliProfile,
) -> Result<Option<ReconcileEngine>, CliError> {
    let Some((url, anon_key)) = profile.remote_config().resolve()? else {
        return Ok(None);
    };

    let remote = PostgrestRemoteStore::new(&url, &anon_key)?;
    let auth = SupabaseAuthService::new(profile_name, &url, &anon_key)
        .map_err(|error| CliError::Auth(error.to_string()))?;

    Ok(Some(ReconcileEngine::new(
        local.clone(),
        Arc::new(remote),
        auth.identity_provider(),
    )))
}

pub fn resolve_data_path(cli_data_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_data_path.or_else(|| env::var_os(DATA_PATH_ENV_VAR).map(PathBuf::from))
    {
        return Ok(path);
    }
    default_data_path()
}

pub fn default_data_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("focus").join("focus.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// Ask before a destructive action. `assume_yes` skips the prompt; without a
/// terminal the action is refused.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<(), CliError> {
    if assume_yes {
        return Ok(());
    }

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::ConfirmationRequired(prompt.to_string()));
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;

    if is_affirmative(&answer) {
        Ok(())
    } else {
        Err(CliError::Cancelled)
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| CliError::InvalidArgument(format!("invalid timestamp '{value}': {error}")))
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_session_lines(sessions: &[Session], now_ms: i64) -> Vec<String> {
    sessions
        .iter()
        .map(|session| {
            let relative_time =
                format_relative_time(session.ended_at.timestamp_millis(), now_ms);
            let minutes = format!("{}/{}m", session.elapsed_minutes(), session.planned_minutes);
            let line = format!(
                "{:<13}  {:<7}  {:>8}  {:<10}  {}",
                short_id(&session.id),
                session.status.as_str(),
                minutes,
                relative_time,
                session.task_title
            );
            match &session.note {
                Some(note) => format!("{line}  ({note})"),
                None => line,
            }
        })
        .collect()
}

pub fn format_interrupt_lines(interrupts: &[Interrupt], now_ms: i64) -> Vec<String> {
    interrupts
        .iter()
        .map(|interrupt| {
            let relative_time = format_relative_time(interrupt.at.timestamp_millis(), now_ms);
            let cooldown = if interrupt.cooldown_done {
                "cooldown"
            } else {
                "-"
            };
            format!(
                "{:<13}  {:<15}  {:<8}  {:<10}  {}",
                short_id(&interrupt.id),
                interrupt.outcome.as_str(),
                cooldown,
                relative_time,
                interrupt.trigger
            )
        })
        .collect()
}

pub fn format_sync_status(status: &SyncStatus) -> String {
    let at = status.at().format("%Y-%m-%d %H:%M:%S UTC");
    match status.reason() {
        Some(reason) => format!("{} at {at}: {reason}", status.state()),
        None => format!("{} at {at}", status.state()),
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
