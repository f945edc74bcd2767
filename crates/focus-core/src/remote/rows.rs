//! Remote row shapes and their conversion to and from local records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{INTERRUPTS_TABLE, SESSIONS_TABLE};
use crate::error::{Error, Result};
use crate::models::{
    Interrupt, InterruptOutcome, Session, SessionStatus, DEFAULT_PLANNED_MINUTES,
};
use crate::util::normalize_text_option;

/// Outgoing `sessions` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRow {
    pub user_id: String,
    pub local_id: String,
    pub task_id: Option<String>,
    pub task_title: String,
    pub planned_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub note: Option<String>,
}

impl SessionRow {
    #[must_use]
    pub fn from_local(user_id: &str, session: &Session) -> Self {
        Self {
            user_id: user_id.to_string(),
            local_id: session.id.clone(),
            task_id: normalize_text_option(Some(session.task_id.clone())),
            task_title: session.task_title.clone(),
            planned_minutes: session.planned_minutes,
            started_at: session.started_at,
            ended_at: session.ended_at,
            status: session.status,
            note: session.note.clone(),
        }
    }
}

/// Outgoing `interrupts` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterruptRow {
    pub user_id: String,
    pub local_id: String,
    pub at: DateTime<Utc>,
    pub trigger: Option<String>,
    pub cooldown_done: bool,
    pub outcome: InterruptOutcome,
}

impl InterruptRow {
    #[must_use]
    pub fn from_local(user_id: &str, interrupt: &Interrupt) -> Self {
        Self {
            user_id: user_id.to_string(),
            local_id: interrupt.id.clone(),
            at: interrupt.at,
            trigger: normalize_text_option(Some(interrupt.trigger.clone())),
            cooldown_done: interrupt.cooldown_done,
            outcome: interrupt.outcome,
        }
    }
}

/// Incoming `sessions` row as the remote returns it. Rows inserted outside
/// this client may miss any column.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteSessionRow {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub local_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_title: Option<String>,
    #[serde(default)]
    pub planned_minutes: Option<i64>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Incoming `interrupts` row
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteInterruptRow {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub local_id: Option<String>,
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub cooldown_done: Option<bool>,
    #[serde(default)]
    pub outcome: Option<String>,
}

pub fn normalize_session(row: RemoteSessionRow) -> Result<Session> {
    let id = record_id(SESSIONS_TABLE, row.local_id, row.id.as_ref())?;
    let planned_minutes = match row.planned_minutes {
        None => DEFAULT_PLANNED_MINUTES,
        Some(minutes) => u32::try_from(minutes)
            .ok()
            .filter(|minutes| *minutes >= 1)
            .ok_or_else(|| invalid(SESSIONS_TABLE, &id, "planned_minutes", &minutes.to_string()))?,
    };
    let status = required(SESSIONS_TABLE, &id, "status", row.status)?;
    let status = status
        .parse::<SessionStatus>()
        .map_err(|_| invalid(SESSIONS_TABLE, &id, "status", &status))?;

    Ok(Session {
        task_id: row.task_id.unwrap_or_default(),
        task_title: row.task_title.unwrap_or_default(),
        planned_minutes,
        started_at: timestamp(SESSIONS_TABLE, &id, "started_at", row.started_at)?,
        ended_at: timestamp(SESSIONS_TABLE, &id, "ended_at", row.ended_at)?,
        status,
        note: normalize_text_option(row.note),
        id,
    })
}

pub fn normalize_interrupt(row: RemoteInterruptRow) -> Result<Interrupt> {
    let id = record_id(INTERRUPTS_TABLE, row.local_id, row.id.as_ref())?;
    let outcome = required(INTERRUPTS_TABLE, &id, "outcome", row.outcome)?;
    let outcome = outcome
        .parse::<InterruptOutcome>()
        .map_err(|_| invalid(INTERRUPTS_TABLE, &id, "outcome", &outcome))?;

    Ok(Interrupt {
        at: timestamp(INTERRUPTS_TABLE, &id, "at", row.at)?,
        trigger: row.trigger.unwrap_or_default(),
        cooldown_done: row.cooldown_done.unwrap_or(false),
        outcome,
        id,
    })
}

/// `local_id` when present, otherwise the stringified surrogate id.
fn record_id(table: &str, local_id: Option<String>, surrogate: Option<&Value>) -> Result<String> {
    if let Some(local_id) = normalize_text_option(local_id) {
        return Ok(local_id);
    }

    match surrogate {
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::Remote(format!(
            "unrecognized {table} row: neither local_id nor id is present"
        ))),
    }
}

fn required(table: &str, id: &str, field: &str, value: Option<String>) -> Result<String> {
    normalize_text_option(value)
        .ok_or_else(|| Error::Remote(format!("unrecognized {table} row {id}: missing {field}")))
}

fn timestamp(table: &str, id: &str, field: &str, value: Option<String>) -> Result<DateTime<Utc>> {
    let value = required(table, id, field, value)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| invalid(table, id, field, &value))
}

fn invalid(table: &str, id: &str, field: &str, value: &str) -> Error {
    Error::Remote(format!(
        "unrecognized {table} row {id}: invalid {field} {value:?}"
    ))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn remote_session(value: Value) -> RemoteSessionRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn outgoing_session_row_uses_natural_key_and_nulls_blank_task() {
        let started_at = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let session = Session::new(
            "",
            "Write parser",
            25,
            started_at,
            started_at + chrono::Duration::minutes(25),
            SessionStatus::Done,
            None,
        );

        let row = SessionRow::from_local("user-1", &session);
        let value = serde_json::to_value(&row).unwrap();

        assert_eq!(value["user_id"], "user-1");
        assert_eq!(value["local_id"], session.id.as_str());
        assert_eq!(value["task_id"], Value::Null);
        assert_eq!(value["note"], Value::Null);
        assert_eq!(value["status"], "done");
        assert_eq!(value["planned_minutes"], 25);
    }

    #[test]
    fn outgoing_interrupt_row_flattens_fields() {
        let at = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let mut interrupt = Interrupt::new(at, None, true, InterruptOutcome::ShortBreak);
        interrupt.trigger = "   ".to_string();

        let value = serde_json::to_value(InterruptRow::from_local("user-1", &interrupt)).unwrap();

        assert_eq!(value["trigger"], Value::Null);
        assert_eq!(value["cooldown_done"], true);
        assert_eq!(value["outcome"], "short_break");
    }

    #[test]
    fn session_defaults_fill_missing_columns() {
        let session = normalize_session(remote_session(json!({
            "id": 42,
            "started_at": "2025-03-03T09:00:00+00:00",
            "ended_at": "2025-03-03T09:20:00.123456+00:00",
            "status": "partial",
            "note": "  "
        })))
        .unwrap();

        assert_eq!(session.id, "42");
        assert_eq!(session.task_id, "");
        assert_eq!(session.task_title, "");
        assert_eq!(session.planned_minutes, DEFAULT_PLANNED_MINUTES);
        assert_eq!(session.status, SessionStatus::Partial);
        assert_eq!(session.note, None);
    }

    #[test]
    fn local_id_takes_precedence_over_surrogate_id() {
        let session = normalize_session(remote_session(json!({
            "id": "9f0c",
            "local_id": "s_local",
            "task_id": "t1",
            "task_title": "Read",
            "planned_minutes": 45,
            "started_at": "2025-03-03T09:00:00Z",
            "ended_at": "2025-03-03T09:45:00Z",
            "status": "done"
        })))
        .unwrap();

        assert_eq!(session.id, "s_local");
        assert_eq!(session.planned_minutes, 45);
    }

    #[test]
    fn unrecognized_session_shapes_are_rejected() {
        let missing_ids = normalize_session(remote_session(json!({
            "started_at": "2025-03-03T09:00:00Z",
            "ended_at": "2025-03-03T09:45:00Z",
            "status": "done"
        })))
        .unwrap_err();
        assert!(missing_ids.is_remote());

        let bad_status = normalize_session(remote_session(json!({
            "local_id": "s1",
            "started_at": "2025-03-03T09:00:00Z",
            "ended_at": "2025-03-03T09:45:00Z",
            "status": "paused"
        })))
        .unwrap_err();
        assert!(bad_status.to_string().contains("status"));

        let bad_minutes = normalize_session(remote_session(json!({
            "local_id": "s1",
            "planned_minutes": 0,
            "started_at": "2025-03-03T09:00:00Z",
            "ended_at": "2025-03-03T09:45:00Z",
            "status": "done"
        })))
        .unwrap_err();
        assert!(bad_minutes.to_string().contains("planned_minutes"));

        let bad_time = normalize_session(remote_session(json!({
            "local_id": "s1",
            "started_at": "yesterday",
            "ended_at": "2025-03-03T09:45:00Z",
            "status": "done"
        })))
        .unwrap_err();
        assert!(bad_time.to_string().contains("started_at"));
    }

    #[test]
    fn interrupt_defaults_fill_missing_columns() {
        let row: RemoteInterruptRow = serde_json::from_value(json!({
            "id": 7,
            "local_id": null,
            "at": "2025-03-03T10:00:00Z",
            "outcome": "return_to_today"
        }))
        .unwrap();

        let interrupt = normalize_interrupt(row).unwrap();
        assert_eq!(interrupt.id, "7");
        assert_eq!(interrupt.trigger, "");
        assert!(!interrupt.cooldown_done);
        assert_eq!(interrupt.outcome, InterruptOutcome::ReturnToToday);
    }

    #[test]
    fn interrupt_without_outcome_is_rejected() {
        let row: RemoteInterruptRow = serde_json::from_value(json!({
            "local_id": "i1",
            "at": "2025-03-03T10:00:00Z"
        }))
        .unwrap();

        let error = normalize_interrupt(row).unwrap_err();
        assert!(error.is_remote());
        assert!(error.to_string().contains("missing outcome"));
    }
}
