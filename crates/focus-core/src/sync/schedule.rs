//! Cancellable fire-once delayed task

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug)]
struct Armed {
    handle: JoinHandle<()>,
    state: Arc<AtomicU8>,
}

/// Runs a future once after a delay unless cancelled first.
///
/// Scheduling again replaces the armed timer. Cancelling only stops a timer
/// that has not fired; once the task body started it runs to completion and
/// can still be awaited with [`ScheduledTask::join`].
#[derive(Debug, Default)]
pub struct ScheduledTask {
    armed: Option<Armed>,
    in_flight: Vec<JoinHandle<()>>,
}

impl ScheduledTask {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let state = Arc::new(AtomicU8::new(ARMED));
        let task_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if task_state
                .compare_exchange(ARMED, FIRED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                task.await;
            }
        });

        self.armed = Some(Armed { handle, state });
    }

    /// Returns true when an armed timer was stopped before firing.
    pub fn cancel(&mut self) -> bool {
        let Some(armed) = self.armed.take() else {
            return false;
        };

        if armed
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            armed.handle.abort();
            true
        } else {
            self.in_flight.retain(|handle| !handle.is_finished());
            if !armed.handle.is_finished() {
                self.in_flight.push(armed.handle);
            }
            false
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|armed| armed.state.load(Ordering::SeqCst) == ARMED)
    }

    /// Wait for the armed timer to fire and finish, plus any task that fired
    /// earlier and is still running.
    pub async fn join(&mut self) {
        let mut handles = std::mem::take(&mut self.in_flight);
        if let Some(armed) = self.armed.take() {
            handles.push(armed.handle);
        }

        for handle in handles {
            if let Err(error) = handle.await {
                if error.is_panic() {
                    tracing::warn!("Scheduled task panicked: {}", error);
                }
            }
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    use super::*;

    const DELAY: Duration = Duration::from_millis(2500);

    fn counting(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();
        task.schedule(DELAY, counting(&counter));

        tokio::time::sleep(Duration::from_millis(2400)).await;
        assert!(task.is_pending());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        task.join().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_armed_timer() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();

        task.schedule(DELAY, counting(&first));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        task.schedule(DELAY, counting(&second));
        task.join().await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_fire_stops_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();
        task.schedule(DELAY, counting(&counter));

        assert!(task.cancel());
        tokio::time::sleep(DELAY * 2).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_tasks_are_not_retained() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();

        for _ in 0..100 {
            task.schedule(Duration::from_millis(10), counting(&counter));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        task.schedule(Duration::from_millis(10), counting(&counter));

        assert!(task.in_flight.is_empty());
        task.join().await;
        assert_eq!(counter.load(Ordering::SeqCst), 101);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_lets_task_finish() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let mut task = ScheduledTask::new();
        task.schedule(DELAY, async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert!(!task.cancel());

        task.join().await;
        assert!(finished.load(Ordering::SeqCst));
    }
}
