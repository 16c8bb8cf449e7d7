//! Single-flight coordination of token refreshes
//!
//! The coordinator is either idle or refreshing. The first caller that finds
//! it idle becomes the leader and starts the refresh on its own task; every
//! caller, the leader included, is parked in a FIFO queue and woken with the
//! outcome once it settles. Cancelling a caller only drops its place in the
//! queue, the refresh itself runs to completion.

use crate::client::error::RefreshError;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Waiter = oneshot::Sender<Result<(), RefreshError>>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<Waiter>,
}

/// How a caller took part in a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRole {
    /// Started the refresh call
    Leader,
    /// Waited for a refresh started by someone else
    Follower,
}

/// Outcome of [`RefreshCoordinator::run`]
#[derive(Debug)]
pub struct RefreshOutcome {
    pub role: RefreshRole,
    pub result: Result<(), RefreshError>,
}

/// Idle/Refreshing guard with a FIFO wait-list
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Join the in-flight refresh, or start one with `refresh` if idle
    ///
    /// `refresh` is only invoked when this caller becomes the leader. The
    /// future it returns is spawned, so it settles even if the leader's own
    /// future is dropped. Waiters are only released with an "abandoned" error
    /// if the refresh task itself dies.
    pub async fn run<F, Fut>(self: &Arc<Self>, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RefreshError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        // Check-and-set happens under one lock with no await in between.
        let role = {
            let mut state = self.lock();
            state.waiters.push_back(tx);
            if state.refreshing {
                RefreshRole::Follower
            } else {
                state.refreshing = true;
                RefreshRole::Leader
            }
        };

        match role {
            RefreshRole::Leader => self.spawn_refresh(refresh()),
            RefreshRole::Follower => trace!("refresh already in flight, queued behind it"),
        }

        let result = rx.await.unwrap_or_else(|_| Err(RefreshError::abandoned()));
        RefreshOutcome { role, result }
    }

    fn spawn_refresh<Fut>(self: &Arc<Self>, refresh: Fut)
    where
        Fut: Future<Output = Result<(), RefreshError>> + Send + 'static,
    {
        let mut guard = SettleGuard {
            coordinator: Arc::clone(self),
            settled: false,
        };
        tokio::spawn(async move {
            let result = refresh.await;
            guard.settle(&result);
        });
    }

    /// Return to idle and wake every waiter in arrival order
    fn settle(&self, result: &Result<(), RefreshError>) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        let mut released = 0;
        for waiter in waiters {
            // A failed send means its caller went away
            if waiter.send(result.clone()).is_ok() {
                released += 1;
            }
        }
        released
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SettleGuard {
    coordinator: Arc<RefreshCoordinator>,
    settled: bool,
}

impl SettleGuard {
    fn settle(&mut self, result: &Result<(), RefreshError>) {
        let released = self.coordinator.settle(result);
        self.settled = true;
        debug!(released, ok = result.is_ok(), "refresh settled");
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh task stopped before completion");
            self.coordinator.settle(&Err(RefreshError::abandoned()));
        }
    }
}
