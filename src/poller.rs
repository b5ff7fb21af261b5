//! Background unread-count polling.
//!
//! One repeating timer re-fetches the unread notification listing and
//! publishes its length. The count is observable through a watch channel,
//! so a badge view just holds a receiver.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::error::AppError;

const POLL_PERIOD: Duration = Duration::from_secs(10);

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polls `GET /notifications?is_read=false` on a fixed period while active.
///
/// `start` while already polling is a no-op, so there is never more than one
/// timer; `stop` cancels the timer and is idempotent. A failed poll cycle is
/// logged and skipped, leaving the last good count in place.
pub struct NotificationPoller {
    api: Arc<ApiClient>,
    period: Duration,
    unread: watch::Sender<usize>,
    task: Mutex<Option<PollTask>>,
}

impl NotificationPoller {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self::with_period(api, POLL_PERIOD)
    }

    /// Same poller with a custom period. The 10-second default is what the
    /// notification badge uses; tests shrink it.
    pub fn with_period(api: Arc<ApiClient>, period: Duration) -> Self {
        let (unread, _) = watch::channel(0);
        Self {
            api,
            period,
            unread,
            task: Mutex::new(None),
        }
    }

    /// Subscribe to unread-count changes.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.unread.subscribe()
    }

    /// Most recently published unread count.
    pub fn unread_count(&self) -> usize {
        *self.unread.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.task.lock().expect("poller lock poisoned").is_some()
    }

    /// Fetch the unread listing once and publish its length.
    pub async fn refresh_now(&self) -> Result<usize, AppError> {
        let count = self.api.unread_notifications().await?.len();
        self.unread.send_replace(count);
        Ok(count)
    }

    /// Start the repeating poll. Fetches immediately, then on every period
    /// tick. Calling while already active leaves the running timer alone.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("poller lock poisoned");
        if task.is_some() {
            tracing::debug!("Notification poller already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.api.clone(),
            self.unread.clone(),
            self.period,
            cancel.clone(),
        ));
        *task = Some(PollTask { cancel, handle });
        tracing::info!(period_secs = self.period.as_secs(), "Notification polling started");
    }

    /// Cancel the running timer. A no-op when not polling.
    pub fn stop(&self) {
        let Some(task) = self.task.lock().expect("poller lock poisoned").take() else {
            return;
        };
        task.cancel.cancel();
        task.handle.abort();
        tracing::info!("Notification polling stopped");
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    api: Arc<ApiClient>,
    unread: watch::Sender<usize>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                match api.unread_notifications().await {
                    Ok(list) => {
                        unread.send_replace(list.len());
                    }
                    Err(e) => {
                        // Skip this cycle; the next tick tries again.
                        tracing::warn!(error = %e, "Unread notification poll failed");
                    }
                }
            }
        }
    }
    tracing::debug!("Notification poll loop exited");
}
