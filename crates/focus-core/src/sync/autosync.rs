//! Debounced background push triggered by local mutations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::{ReconcileEngine, ScheduledTask, SyncStatusPublisher};
use crate::error::Result;
use crate::models::{Interrupt, Session, SyncStatus};

/// Cheap fingerprint of the local collections: lengths plus newest ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSignature {
    sessions: usize,
    interrupts: usize,
    newest_session: Option<String>,
    newest_interrupt: Option<String>,
}

impl ChangeSignature {
    #[must_use]
    pub fn of(sessions: &[Session], interrupts: &[Interrupt]) -> Self {
        Self {
            sessions: sessions.len(),
            interrupts: interrupts.len(),
            newest_session: sessions.first().map(|session| session.id.clone()),
            newest_interrupt: interrupts.first().map(|interrupt| interrupt.id.clone()),
        }
    }
}

/// What a change notification did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSyncDecision {
    /// Same signature as last time
    Unchanged,
    /// A previous cycle found no identity
    Blocked,
    /// A push is armed for after the delay
    Scheduled,
}

#[derive(Debug, Default)]
struct AutoSyncState {
    last_signature: Option<ChangeSignature>,
    timer: ScheduledTask,
}

/// Auto-sync context for one running client.
pub struct AutoSync {
    engine: ReconcileEngine,
    status: Arc<SyncStatusPublisher>,
    delay: Duration,
    identity_missing: Arc<AtomicBool>,
    state: Mutex<AutoSyncState>,
}

impl AutoSync {
    pub fn new(engine: ReconcileEngine, status: Arc<SyncStatusPublisher>, delay: Duration) -> Self {
        Self {
            engine,
            status,
            delay,
            identity_missing: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(AutoSyncState::default()),
        }
    }

    #[must_use]
    pub fn status(&self) -> &SyncStatusPublisher {
        &self.status
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.identity_missing.load(Ordering::SeqCst)
    }

    /// Report the current local collections. Arms (or re-arms) the push timer
    /// when they differ from the last report.
    pub async fn notify_local_change(
        &self,
        sessions: &[Session],
        interrupts: &[Interrupt],
    ) -> AutoSyncDecision {
        let signature = ChangeSignature::of(sessions, interrupts);
        let mut state = self.state.lock().await;

        if state.last_signature.as_ref() == Some(&signature) {
            tracing::debug!("Local collections unchanged; auto-sync skipped");
            return AutoSyncDecision::Unchanged;
        }
        state.last_signature = Some(signature);

        if self.is_blocked() {
            tracing::debug!("Not signed in; auto-sync blocked");
            return AutoSyncDecision::Blocked;
        }

        let engine = self.engine.clone();
        let status = Arc::clone(&self.status);
        let identity_missing = Arc::clone(&self.identity_missing);
        state.timer.schedule(self.delay, async move {
            run_cycle(engine, status, identity_missing).await;
        });
        tracing::debug!(delay = ?self.delay, "Auto-sync armed");
        AutoSyncDecision::Scheduled
    }

    /// Wait for an armed or running push to finish.
    pub async fn flush(&self) {
        self.state.lock().await.timer.join().await;
    }

    /// Stop an armed push that has not fired yet.
    pub async fn cancel(&self) -> bool {
        self.state.lock().await.timer.cancel()
    }

    /// Feed back the outcome of a manual push or pull. A missing identity
    /// blocks auto-sync the same way a failed background push does.
    pub async fn observe<T>(&self, result: &Result<T>) {
        if matches!(result, Err(error) if error.is_not_signed_in()) {
            self.mark_signed_out().await;
        }
    }

    pub async fn mark_signed_out(&self) {
        self.identity_missing.store(true, Ordering::SeqCst);
        self.cancel().await;
    }

    /// Forget the last signature and the blocked flag, e.g. after sign-in or
    /// sign-out.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.timer.cancel();
        state.last_signature = None;
        self.identity_missing.store(false, Ordering::SeqCst);
    }
}

async fn run_cycle(
    engine: ReconcileEngine,
    status: Arc<SyncStatusPublisher>,
    identity_missing: Arc<AtomicBool>,
) {
    let snapshot = engine.local().snapshot().await;
    if snapshot.is_empty() {
        status.publish(SyncStatus::idle()).await;
        return;
    }

    status.publish(SyncStatus::syncing()).await;
    match engine.push(&snapshot.sessions, &snapshot.interrupts).await {
        Ok(_) => status.publish(SyncStatus::synced()).await,
        Err(error) => {
            if error.is_not_signed_in() {
                identity_missing.store(true, Ordering::SeqCst);
            }
            tracing::warn!("Auto-sync failed: {}", error);
            status.publish(SyncStatus::failed(error.to_string())).await;
        }
    }
}
