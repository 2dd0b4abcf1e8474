//! Idle detection.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Fires a callback once no activity has been recorded for `timeout`.
///
/// After firing, the idle clock restarts; the callback fires again only after
/// another full idle period.
#[derive(Debug)]
pub struct InactivityMonitor {
    timeout: Duration,
    last_activity: Mutex<Instant>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl InactivityMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_activity: Mutex::new(Instant::now()),
            task: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn last(&self) -> MutexGuard<'_, Instant> {
        self.last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn task_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Any user input: pointer, key, scroll or touch.
    pub fn record_activity(&self) {
        *self.last() = Instant::now();
    }

    pub fn idle_deadline(&self) -> Instant {
        *self.last() + self.timeout
    }

    pub fn start<F, Fut>(self: &Arc<Self>, on_idle: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.task_slot();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        self.record_activity();

        let monitor = Arc::downgrade(self);
        *slot = Some(tokio::spawn(async move {
            loop {
                let Some(deadline) = monitor.upgrade().map(|m| m.idle_deadline()) else {
                    break;
                };
                sleep_until(deadline).await;

                let Some(m) = monitor.upgrade() else {
                    break;
                };
                if Instant::now() >= m.idle_deadline() {
                    tracing::info!(timeout = ?m.timeout, "user inactive");
                    m.record_activity();
                    drop(m);
                    on_idle().await;
                }
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(task) = self.task_slot().take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task_slot()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for InactivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
