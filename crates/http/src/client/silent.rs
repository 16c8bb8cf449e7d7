//! Proactive token renewal on a timer

use crate::client::ClientInner;
use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Owns the background task that refreshes the session before the access
/// token expires
///
/// At most one timer runs per client. Scheduling replaces the running
/// timer; dropping the handle stops it.
#[derive(Default)]
pub(crate) struct SilentRefresh {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SilentRefresh {
    /// Start (or restart) the timer
    ///
    /// The task holds only a weak reference so it never keeps a dropped
    /// client alive.
    pub(crate) fn schedule(&self, client: Weak<ClientInner>, interval: Duration) {
        let task = tokio::spawn(run_timer(client, interval));
        let previous = self.slot().replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!(interval_secs = interval.as_secs(), "silent refresh scheduled");
    }

    /// Stop the timer if one is running
    pub(crate) fn cancel(&self) {
        let task = self.slot().take();
        if let Some(task) = task {
            task.abort();
            debug!("silent refresh cancelled");
        }
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SilentRefresh {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_timer(client: Weak<ClientInner>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let Some(client) = client.upgrade() else {
            return;
        };

        // A failed refresh ends the session from the refresh task, which
        // also cancels this one.
        match client.refresh_session().await {
            Ok(()) => debug!("silent refresh succeeded, rescheduling"),
            Err(err) => {
                warn!(error = %err, "silent refresh failed, session ended");
                return;
            }
        }
    }
}
