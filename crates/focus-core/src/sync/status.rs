//! Single current sync status, persisted then broadcast

use tokio::sync::watch;

use crate::models::SyncStatus;
use crate::store::LocalStore;

/// Holds the latest [`SyncStatus`]. Each transition is written to the local
/// store (for observers in other processes) and then sent to in-process
/// subscribers.
pub struct SyncStatusPublisher {
    local: LocalStore,
    tx: watch::Sender<SyncStatus>,
}

impl SyncStatusPublisher {
    /// Start from the persisted status, or idle when none was saved.
    pub async fn load(local: LocalStore) -> Self {
        let current = local.load_status().await;
        let (tx, _rx) = watch::channel(current);
        Self { local, tx }
    }

    #[must_use]
    pub fn current(&self) -> SyncStatus {
        self.tx.borrow().clone()
    }

    pub async fn publish(&self, status: SyncStatus) {
        tracing::debug!(state = status.state(), "Sync status changed");
        self.local.save_status(&status).await;
        self.tx.send_replace(status);
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    pub async fn reset(&self) {
        self.publish(SyncStatus::idle()).await;
    }
}
