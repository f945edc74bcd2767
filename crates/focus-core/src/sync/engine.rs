//! Push, pull-merge and pull-overwrite

use std::collections::HashMap;
use std::sync::Arc;

use super::SyncCounts;
use crate::error::Result;
use crate::identity::{require_identity, Identity, IdentityProvider};
use crate::models::{Interrupt, Record, Session};
use crate::remote::{InterruptRow, RemoteStore, SessionRow};
use crate::store::LocalStore;

/// Reconciles the local collections with the identity-scoped remote copy.
///
/// Every cycle resolves the identity before any remote I/O, so a signed-out
/// user gets [`crate::Error::NotSignedIn`] and the remote is never touched.
#[derive(Clone)]
pub struct ReconcileEngine {
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl ReconcileEngine {
    pub fn new(
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            local,
            remote,
            identity,
        }
    }

    #[must_use]
    pub const fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Upsert the given records. Returns the number of rows sent.
    pub async fn push(&self, sessions: &[Session], interrupts: &[Interrupt]) -> Result<SyncCounts> {
        let identity = self.identity().await?;
        let session_rows: Vec<SessionRow> = sessions
            .iter()
            .map(|session| SessionRow::from_local(&identity.user_id, session))
            .collect();
        let interrupt_rows: Vec<InterruptRow> = interrupts
            .iter()
            .map(|interrupt| InterruptRow::from_local(&identity.user_id, interrupt))
            .collect();

        let counts = self
            .remote
            .upsert(&identity, &session_rows, &interrupt_rows)
            .await?;
        tracing::info!(
            sessions = counts.sessions,
            interrupts = counts.interrupts,
            "Pushed local records"
        );
        Ok(counts)
    }

    /// Push whatever the local store currently holds.
    pub async fn push_local(&self) -> Result<SyncCounts> {
        let snapshot = self.local.snapshot().await;
        self.push(&snapshot.sessions, &snapshot.interrupts).await
    }

    /// Merge the remote copy into the local collections, remote wins on id
    /// collision and local-only records are kept.
    pub async fn pull_merge(&self) -> Result<SyncCounts> {
        let (sessions, interrupts) = self.fetch_normalized().await?;
        let counts = SyncCounts {
            sessions: sessions.len(),
            interrupts: interrupts.len(),
        };

        let local = self.local.snapshot().await;
        self.local
            .replace_sessions(&merge_by_id(&local.sessions, sessions))
            .await;
        self.local
            .replace_interrupts(&merge_by_id(&local.interrupts, interrupts))
            .await;

        tracing::info!(
            sessions = counts.sessions,
            interrupts = counts.interrupts,
            "Merged remote records"
        );
        Ok(counts)
    }

    /// Replace the local collections with the remote copy. Local-only records
    /// are discarded; callers confirm with the user first.
    pub async fn pull_overwrite(&self) -> Result<SyncCounts> {
        let (sessions, interrupts) = self.fetch_normalized().await?;
        let counts = SyncCounts {
            sessions: sessions.len(),
            interrupts: interrupts.len(),
        };

        self.local.replace_sessions(&sessions).await;
        self.local.replace_interrupts(&interrupts).await;

        tracing::info!(
            sessions = counts.sessions,
            interrupts = counts.interrupts,
            "Overwrote local records from remote"
        );
        Ok(counts)
    }

    /// Rows the remote holds for the current identity.
    pub async fn remote_counts(&self) -> Result<SyncCounts> {
        let identity = self.identity().await?;
        Ok(self.remote.fetch_all(&identity).await?.counts())
    }

    async fn identity(&self) -> Result<Identity> {
        require_identity(self.identity.as_ref()).await
    }

    async fn fetch_normalized(&self) -> Result<(Vec<Session>, Vec<Interrupt>)> {
        let identity = self.identity().await?;
        self.remote.fetch_all(&identity).await?.normalize()
    }
}

/// Local records first in their order, remote-only records appended in remote
/// order. A remote record sharing an id replaces the local one in place.
pub fn merge_by_id<T: Record + Clone>(local: &[T], remote: Vec<T>) -> Vec<T> {
    let mut merged = local.to_vec();
    let mut positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(index, record)| (record.record_id().to_string(), index))
        .collect();

    for record in remote {
        if let Some(&index) = positions.get(record.record_id()) {
            merged[index] = record;
        } else {
            positions.insert(record.record_id().to_string(), merged.len());
            merged.push(record);
        }
    }

    merged
}
