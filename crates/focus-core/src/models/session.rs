//! Focus session model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{new_record_id, normalize_text_option};

/// Planned duration used when nothing else is known.
pub const DEFAULT_PLANNED_MINUTES: u32 = 20;

/// Terminal classification of a focus attempt, set once at save time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Ran to the planned end
    Done,
    /// Stopped early but some focus happened
    Partial,
    /// Given up
    Aborted,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Partial => "partial",
            Self::Aborted => "aborted",
        }
    }

    /// Done and partial attempts both count towards focus totals.
    #[must_use]
    pub const fn counts_as_focus(self) -> bool {
        matches!(self, Self::Done | Self::Partial)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "done" => Ok(Self::Done),
            "partial" => Ok(Self::Partial),
            "aborted" => Ok(Self::Aborted),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

/// One completed or attempted focus session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Client-generated id, the merge key
    pub id: String,
    /// Denormalized task reference
    pub task_id: String,
    pub task_title: String,
    /// Scheduled duration in minutes
    pub planned_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: SessionStatus,
    /// Optional free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Session {
    /// Create a session with a fresh client id.
    #[must_use]
    pub fn new(
        task_id: impl Into<String>,
        task_title: impl Into<String>,
        planned_minutes: u32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        status: SessionStatus,
        note: Option<String>,
    ) -> Self {
        Self {
            id: new_record_id("s"),
            task_id: task_id.into(),
            task_title: task_title.into(),
            planned_minutes: planned_minutes.max(1),
            started_at,
            ended_at,
            status,
            note: normalize_text_option(note),
        }
    }

    /// Wall-clock minutes between start and end, rounded and floored at zero.
    #[must_use]
    pub fn elapsed_minutes(&self) -> i64 {
        let millis = (self.ended_at - self.started_at).num_milliseconds().max(0);
        (millis + 30_000) / 60_000
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, minute, 0).unwrap()
    }

    #[test]
    fn new_session_trims_note_and_generates_id() {
        let session = Session::new(
            "t1",
            "Write a timer",
            20,
            at(0),
            at(20),
            SessionStatus::Done,
            Some("   ".to_string()),
        );
        assert!(session.id.starts_with("s_"));
        assert_eq!(session.note, None);
    }

    #[test]
    fn session_serializes_camel_case() {
        let mut session = Session::new("t1", "Title", 20, at(0), at(20), SessionStatus::Partial, None);
        session.id = "s1".to_string();

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["taskTitle"], "Title");
        assert_eq!(value["plannedMinutes"], 20);
        assert_eq!(value["status"], "partial");
        assert!(value.get("note").is_none());
    }

    #[test]
    fn status_parses_wire_strings() {
        assert_eq!("done".parse::<SessionStatus>(), Ok(SessionStatus::Done));
        assert_eq!("aborted".parse::<SessionStatus>(), Ok(SessionStatus::Aborted));
        assert!("finished".parse::<SessionStatus>().is_err());
        assert!(SessionStatus::Partial.counts_as_focus());
        assert!(!SessionStatus::Aborted.counts_as_focus());
    }

    #[test]
    fn elapsed_minutes_never_negative() {
        let mut session = Session::new("t1", "Title", 20, at(0), at(19), SessionStatus::Done, None);
        assert_eq!(session.elapsed_minutes(), 19);

        session.ended_at = at(0) - chrono::Duration::minutes(5);
        assert_eq!(session.elapsed_minutes(), 0);
    }
}
