//! Local backup export and import.
//!
//! A backup holds the raw serialized collection blobs exactly as stored, so
//! export then import restores the store byte for byte. Independent of the
//! remote sync path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Interrupt, Session};
use crate::store::{LocalStore, INTERRUPTS_KEY, SESSIONS_KEY};

/// Serialized backup document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupBundle {
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub sessions: Option<String>,
    #[serde(default)]
    pub interrupts: Option<String>,
}

/// Which collections an import replaced, with their record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub sessions: Option<usize>,
    pub interrupts: Option<usize>,
}

/// Capture the raw blobs. A collection never written is `None`.
pub async fn export_backup(local: &LocalStore) -> Result<BackupBundle> {
    Ok(BackupBundle {
        exported_at: Utc::now(),
        sessions: local.raw(SESSIONS_KEY).await?,
        interrupts: local.raw(INTERRUPTS_KEY).await?,
    })
}

/// Render a backup as pretty-printed JSON.
pub fn render_backup_json(bundle: &BackupBundle) -> serde_json::Result<String> {
    serde_json::to_string_pretty(bundle)
}

/// Parse a backup document, checking that each present blob holds the
/// collection it claims to.
pub fn parse_backup(payload: &str) -> Result<BackupBundle> {
    let bundle: BackupBundle = serde_json::from_str(payload)
        .map_err(|error| Error::InvalidInput(format!("invalid backup JSON: {error}")))?;

    if let Some(sessions) = &bundle.sessions {
        count_records::<Session>(sessions, "sessions")?;
    }
    if let Some(interrupts) = &bundle.interrupts {
        count_records::<Interrupt>(interrupts, "interrupts")?;
    }
    Ok(bundle)
}

/// Write the blobs present in `bundle` verbatim. Absent collections are left
/// as they are.
pub async fn import_backup(local: &LocalStore, bundle: &BackupBundle) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    if let Some(sessions) = &bundle.sessions {
        summary.sessions = Some(count_records::<Session>(sessions, "sessions")?);
        local.write_raw(SESSIONS_KEY, sessions).await?;
    }
    if let Some(interrupts) = &bundle.interrupts {
        summary.interrupts = Some(count_records::<Interrupt>(interrupts, "interrupts")?);
        local.write_raw(INTERRUPTS_KEY, interrupts).await?;
    }

    tracing::info!(
        sessions = ?summary.sessions,
        interrupts = ?summary.interrupts,
        exported_at = %bundle.exported_at,
        "Imported backup"
    );
    Ok(summary)
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_backup_file_name(timestamp_ms: i64) -> String {
    format!("focus-backup-{timestamp_ms}.json")
}

fn count_records<T: serde::de::DeserializeOwned>(blob: &str, label: &str) -> Result<usize> {
    serde_json::from_str::<Vec<T>>(blob)
        .map(|records| records.len())
        .map_err(|error| Error::InvalidInput(format!("backup {label} are not readable: {error}")))
}
