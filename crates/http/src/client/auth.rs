//! Authentication API client methods

use super::config::{LOGIN_PATH, LOGOUT_PATH, STATUS_PATH};
use super::error::ClientError;
use super::transport::ApiRequest;
use super::AuthenticatedRequestClient;
use crate::types::{LoginRequest, LoginResponse, StatusResponse, UserProfile};
use reqwest::{Method, StatusCode};
use std::sync::PoisonError;
use tokio::time::Instant;

const RATE_LIMITED_MESSAGE: &str = "Too many login attempts. Please wait before trying again.";

impl AuthenticatedRequestClient {
    /// Sign in with email and password
    ///
    /// On success the backend sets the session cookies, the user is stored
    /// locally and the silent refresh timer starts.
    ///
    /// # Errors
    ///
    /// - [`ClientError::RateLimited`] on 429, and for every attempt made
    ///   before the cooldown that follows it has elapsed
    /// - [`ClientError::Http`] for rejected credentials (no refresh is
    ///   attempted for the login endpoint)
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        self.check_login_cooldown()?;

        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = ApiRequest::new(Method::POST, LOGIN_PATH).with_body(body);
        let response = self.inner.transport.send(&request).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .retry_after()
                .unwrap_or_else(|| self.inner.config.login_cooldown());
            self.lock_login_until(Instant::now() + retry_after);

            let message = ClientError::from_response(&response).message();
            warn!(retry_after_secs = retry_after.as_secs(), "login rate limited");
            return Err(ClientError::RateLimited {
                message: if message.is_empty() {
                    RATE_LIMITED_MESSAGE.to_string()
                } else {
                    message
                },
                retry_after: Some(retry_after),
            });
        }
        if !response.is_success() {
            return Err(ClientError::from_response(&response));
        }

        let profile = UserProfile::from(response.json::<LoginResponse>()?);
        info!(username = %profile.username, "logged in");
        self.inner.session.set(profile.clone());
        self.inner.schedule_silent_refresh();
        Ok(profile)
    }

    /// Ask the backend who is signed in
    ///
    /// Goes through [`request`](Self::request), so an expired access token is
    /// refreshed transparently. On success the user is stored locally and the
    /// silent refresh timer is restarted.
    pub async fn status(&self) -> Result<UserProfile, ClientError> {
        let response = self.request(Method::GET, STATUS_PATH, None).await?;
        let profile = UserProfile::from(response.json::<StatusResponse>()?);

        self.inner.session.set(profile.clone());
        self.inner.schedule_silent_refresh();
        Ok(profile)
    }

    /// Sign out
    ///
    /// Local state is cleared and the timer stopped whatever the server
    /// answers; a failed server call is still reported.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.request(Method::POST, LOGOUT_PATH, None).await;

        self.inner.silent.cancel();
        if let Some(profile) = self.inner.session.clear() {
            info!(username = %profile.username, "logged out");
        }
        result.map(|_| ())
    }

    /// Refresh the access token now
    ///
    /// Shares the single in-flight refresh with requests that hit 401.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.inner.refresh_session().await
    }

    fn check_login_cooldown(&self) -> Result<(), ClientError> {
        let mut locked_until = self
            .inner
            .login_locked_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        match *locked_until {
            Some(until) if now < until => Err(ClientError::RateLimited {
                message: RATE_LIMITED_MESSAGE.to_string(),
                retry_after: Some(until.saturating_duration_since(now)),
            }),
            Some(_) => {
                *locked_until = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn lock_login_until(&self, until: Instant) {
        *self
            .inner
            .login_locked_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(until);
    }
}
