//! Remote Store Client.
//!
//! Two identity-scoped tables, `sessions` and `interrupts`, keyed by the
//! natural key `(user_id, local_id)`. Re-pushing a record never creates a
//! second row.

mod memory;
mod postgrest;
mod rows;

use async_trait::async_trait;

pub use memory::InMemoryRemoteStore;
pub use postgrest::{normalize_rest_url, PostgrestRemoteStore};
pub use rows::{
    normalize_interrupt, normalize_session, InterruptRow, RemoteInterruptRow, RemoteSessionRow,
    SessionRow,
};

use crate::error::Result;
use crate::identity::Identity;
use crate::models::{Interrupt, Session};
use crate::sync::SyncCounts;

pub const SESSIONS_TABLE: &str = "sessions";
pub const INTERRUPTS_TABLE: &str = "interrupts";
/// Upsert conflict target on both tables
pub const NATURAL_KEY: &str = "user_id,local_id";

/// Every row the remote holds for one identity, newest first
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    pub sessions: Vec<RemoteSessionRow>,
    pub interrupts: Vec<RemoteInterruptRow>,
}

impl RemoteSnapshot {
    #[must_use]
    pub fn counts(&self) -> SyncCounts {
        SyncCounts {
            sessions: self.sessions.len(),
            interrupts: self.interrupts.len(),
        }
    }

    /// Convert every row back to local shape, rejecting the whole snapshot on
    /// the first unrecognized row.
    pub fn normalize(self) -> Result<(Vec<Session>, Vec<Interrupt>)> {
        let sessions = self
            .sessions
            .into_iter()
            .map(normalize_session)
            .collect::<Result<Vec<_>>>()?;
        let interrupts = self
            .interrupts
            .into_iter()
            .map(normalize_interrupt)
            .collect::<Result<Vec<_>>>()?;
        Ok((sessions, interrupts))
    }
}

/// Data access to the remote relational store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read all rows scoped to `identity`. Fails as a whole; never partial.
    async fn fetch_all(&self, identity: &Identity) -> Result<RemoteSnapshot>;

    /// Bulk upsert both tables on the natural key. The two writes are
    /// independent; one may land while the other fails.
    async fn upsert(
        &self,
        identity: &Identity,
        sessions: &[SessionRow],
        interrupts: &[InterruptRow],
    ) -> Result<SyncCounts>;
}
