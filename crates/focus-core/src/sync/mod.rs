//! Reconciliation between the local store and the remote store.
//!
//! [`ReconcileEngine`] runs the three manual cycles (push, pull-merge,
//! pull-overwrite). [`AutoSync`] turns local mutations into a debounced push
//! and reports the outcome through [`SyncStatusPublisher`].

mod autosync;
mod engine;
mod schedule;
mod status;

use serde::Serialize;

pub use autosync::{AutoSync, AutoSyncDecision, ChangeSignature};
pub use engine::{merge_by_id, ReconcileEngine};
pub use schedule::ScheduledTask;
pub use status::SyncStatusPublisher;

/// Rows sent or received per table in one reconciliation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub sessions: usize,
    pub interrupts: usize,
}

impl SyncCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.sessions + self.interrupts
    }
}
