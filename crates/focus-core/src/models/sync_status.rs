//! Sync status model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent state of background synchronization, tagged with a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncStatus {
    Idle {
        at: DateTime<Utc>,
    },
    Syncing {
        at: DateTime<Utc>,
    },
    Synced {
        at: DateTime<Utc>,
    },
    Failed {
        at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl SyncStatus {
    #[must_use]
    pub fn idle() -> Self {
        Self::Idle { at: Utc::now() }
    }

    #[must_use]
    pub fn syncing() -> Self {
        Self::Syncing { at: Utc::now() }
    }

    #[must_use]
    pub fn synced() -> Self {
        Self::Synced { at: Utc::now() }
    }

    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            at: Utc::now(),
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Idle { at } | Self::Syncing { at } | Self::Synced { at } | Self::Failed { at, .. } => {
                *at
            }
        }
    }

    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Syncing { .. } => "syncing",
            Self::Synced { .. } => "synced",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure reason, if this is a failed state that recorded one.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::idle()
    }
}
