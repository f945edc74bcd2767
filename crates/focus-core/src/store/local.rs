//! Typed facade over the blob store

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{BlobStore, INTERRUPTS_KEY, SESSIONS_KEY, SYNC_STATUS_KEY};
use crate::error::Result;
use crate::models::{Interrupt, Session, SyncStatus};

/// Both local collections read at one point in time, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    pub sessions: Vec<Session>,
    pub interrupts: Vec<Interrupt>,
}

impl LocalSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.interrupts.is_empty()
    }
}

/// Local persistence for sessions, interrupts and sync status.
///
/// Reads never fail: a missing or unreadable blob is an empty collection.
/// Collection writes are best-effort and only logged on failure, since the
/// next remote pull can restore lost data.
#[derive(Clone)]
pub struct LocalStore {
    blobs: Arc<dyn BlobStore>,
}

impl LocalStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.read_collection(SESSIONS_KEY).await
    }

    pub async fn interrupts(&self) -> Vec<Interrupt> {
        self.read_collection(INTERRUPTS_KEY).await
    }

    pub async fn snapshot(&self) -> LocalSnapshot {
        LocalSnapshot {
            sessions: self.sessions().await,
            interrupts: self.interrupts().await,
        }
    }

    pub async fn replace_sessions(&self, sessions: &[Session]) {
        self.write_best_effort(SESSIONS_KEY, sessions).await;
    }

    pub async fn replace_interrupts(&self, interrupts: &[Interrupt]) {
        self.write_best_effort(INTERRUPTS_KEY, interrupts).await;
    }

    /// Prepend a session and keep only the `limit` most recent ones.
    pub async fn record_session(&self, session: Session, limit: usize) -> Vec<Session> {
        let mut sessions = self.sessions().await;
        sessions.retain(|existing| existing.id != session.id);
        sessions.insert(0, session);
        sessions.truncate(limit.max(1));
        self.replace_sessions(&sessions).await;
        sessions
    }

    /// Prepend an interrupt and keep only the `limit` most recent ones.
    pub async fn record_interrupt(&self, interrupt: Interrupt, limit: usize) -> Vec<Interrupt> {
        let mut interrupts = self.interrupts().await;
        interrupts.retain(|existing| existing.id != interrupt.id);
        interrupts.insert(0, interrupt);
        interrupts.truncate(limit.max(1));
        self.replace_interrupts(&interrupts).await;
        interrupts
    }

    /// Persisted sync status, or a fresh `idle` when absent or unreadable.
    pub async fn load_status(&self) -> SyncStatus {
        match self.blobs.get(SYNC_STATUS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                tracing::warn!("Ignoring unreadable sync status: {}", error);
                SyncStatus::idle()
            }),
            Ok(None) => SyncStatus::idle(),
            Err(error) => {
                tracing::warn!("Failed to read sync status: {}", error);
                SyncStatus::idle()
            }
        }
    }

    pub async fn save_status(&self, status: &SyncStatus) {
        self.write_best_effort(SYNC_STATUS_KEY, status).await;
    }

    /// Raw blob exactly as stored, for backups.
    pub async fn raw(&self, key: &str) -> Result<Option<String>> {
        self.blobs.get(key).await
    }

    /// Store a raw blob verbatim, reporting failure to the caller.
    pub async fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.blobs.set(key, value).await
    }

    async fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.blobs.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!("Failed to read {}: {}", key, error);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|error| {
            tracing::warn!("Treating unreadable {} as empty: {}", key, error);
            Vec::new()
        })
    }

    async fn write_best_effort<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!("Failed to serialize {}: {}", key, error);
                return;
            }
        };

        if let Err(error) = self.blobs.set(key, &raw).await {
            tracing::warn!("Failed to persist {}: {}", key, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{InterruptOutcome, SessionStatus};
    use crate::store::MemoryBlobStore;

    fn session(id: &str) -> Session {
        let now = Utc::now();
        let mut session = Session::new("t1", "Title", 20, now, now, SessionStatus::Done, None);
        session.id = id.to_string();
        session
    }

    fn store() -> (LocalStore, MemoryBlobStore) {
        let blobs = MemoryBlobStore::new();
        (LocalStore::new(Arc::new(blobs.clone())), blobs)
    }

    #[tokio::test]
    async fn first_access_yields_empty_collections() {
        let (local, _) = store();
        assert!(local.snapshot().await.is_empty());
        assert_eq!(local.load_status().await.state(), "idle");
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_empty() {
        let (local, blobs) = store();
        blobs.set(SESSIONS_KEY, "{not json").await.unwrap();
        assert!(local.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn record_session_prepends_and_caps() {
        let (local, _) = store();
        for id in ["a", "b", "c"] {
            local.record_session(session(id), 2).await;
        }

        let ids = local
            .sessions()
            .await
            .into_iter()
            .map(|s| s.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["c".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn record_interrupt_keeps_ids_unique() {
        let (local, _) = store();
        let interrupt = Interrupt::new(Utc::now(), None, false, InterruptOutcome::Quit);
        local.record_interrupt(interrupt.clone(), 50).await;
        local.record_interrupt(interrupt, 50).await;
        assert_eq!(local.interrupts().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_write_is_tolerated() {
        let (local, blobs) = store();
        local.replace_sessions(&[session("keep")]).await;

        blobs.set_fail_writes(true);
        local.replace_sessions(&[]).await;

        assert_eq!(local.sessions().await.len(), 1);
        assert!(local.write_raw(SESSIONS_KEY, "[]").await.is_err());
    }
}
