//! Local session state and login-route navigation

use crate::types::UserProfile;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Where the application currently is, and how to send it elsewhere
///
/// The client uses this to send the user back to the login route when the
/// session cannot be refreshed.
pub trait Navigator: Send + Sync {
    /// Route currently shown, e.g. `/inquiries`
    fn current_route(&self) -> String;

    /// Move to `route`
    fn navigate(&self, route: &str);
}

/// In-memory [`Navigator`] that records every navigation
#[derive(Debug)]
pub struct RouteTracker {
    inner: Mutex<RouteHistory>,
}

#[derive(Debug)]
struct RouteHistory {
    current: String,
    navigations: Vec<String>,
}

impl RouteTracker {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(RouteHistory {
                current: initial.into(),
                navigations: Vec::new(),
            }),
        }
    }

    /// Change the current route without recording a navigation
    pub fn set_route(&self, route: impl Into<String>) {
        self.with(|history| history.current = route.into());
    }

    /// Navigations performed through [`Navigator::navigate`], oldest first
    pub fn navigations(&self) -> Vec<String> {
        self.with(|history| history.navigations.clone())
    }

    fn with<R>(&self, f: impl FnOnce(&mut RouteHistory) -> R) -> R {
        let mut history = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut history)
    }
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for RouteTracker {
    fn current_route(&self) -> String {
        self.with(|history| history.current.clone())
    }

    fn navigate(&self, route: &str) {
        info!(route, "navigating");
        self.with(|history| {
            history.current = route.to_string();
            history.navigations.push(route.to_string());
        });
    }
}

/// The signed-in user as known locally
///
/// Tokens live in cookies owned by the transport; this only tracks who is
/// signed in so callers can react when the session ends.
#[derive(Debug)]
pub struct SessionState {
    profile: watch::Sender<Option<UserProfile>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (profile, _) = watch::channel(None);
        Self { profile }
    }

    pub fn current(&self) -> Option<UserProfile> {
        self.profile.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.borrow().is_some()
    }

    /// Observe sign-in and sign-out transitions
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.profile.subscribe()
    }

    pub(crate) fn set(&self, profile: UserProfile) {
        self.profile.send_replace(Some(profile));
    }

    /// Forget the user, returning who was signed in
    pub(crate) fn clear(&self) -> Option<UserProfile> {
        self.profile.send_replace(None)
    }
}
