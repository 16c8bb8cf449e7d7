//! Client configuration

use crate::client::error::ClientError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Endpoint that issues the login cookies
pub const LOGIN_PATH: &str = "/auth/login";
/// Endpoint that exchanges the refresh cookie for a new access cookie
pub const REFRESH_PATH: &str = "/refresh-token";
/// Endpoint that reports the authenticated user
pub const STATUS_PATH: &str = "/auth/status";
/// Endpoint that clears the cookies server side
pub const LOGOUT_PATH: &str = "/logout";

/// Configuration for [`AuthenticatedRequestClient`](crate::AuthenticatedRequestClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:5000`
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Delay between silent refreshes. Must be shorter than the access token
    /// lifetime (15 minutes on the backend).
    pub silent_refresh_secs: u64,

    /// Fallback lockout after a rate-limited login when the server sends no
    /// `Retry-After` header
    pub login_cooldown_secs: u64,

    /// Route the navigator is sent to when the session ends
    pub login_route: String,

    /// Paths whose 401 responses never trigger a refresh
    pub exempt_paths: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            user_agent: concat!("repairdesk-client/", env!("CARGO_PKG_VERSION")).to_string(),
            silent_refresh_secs: 14 * 60,
            login_cooldown_secs: 60,
            login_route: "/login".to_string(),
            exempt_paths: vec![
                LOGIN_PATH.to_string(),
                REFRESH_PATH.to_string(),
                LOGOUT_PATH.to_string(),
            ],
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given backend with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Check that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the base URL is not an
    /// absolute http(s) URL or the refresh interval is zero.
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.silent_refresh_secs == 0 {
            return Err(ClientError::Configuration(
                "silent_refresh_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn silent_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.silent_refresh_secs)
    }

    pub fn login_cooldown(&self) -> Duration {
        Duration::from_secs(self.login_cooldown_secs)
    }

    /// Whether a 401 on `path` must be surfaced without refreshing
    pub fn is_exempt(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = path.trim_end_matches('/');
        self.exempt_paths
            .iter()
            .any(|exempt| exempt.trim_end_matches('/') == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exempt_paths() {
        let config = ClientConfig::default();
        assert!(config.is_exempt("/auth/login"));
        assert!(config.is_exempt("/refresh-token"));
        assert!(config.is_exempt("/logout"));
        assert!(config.is_exempt("/refresh-token?source=timer"));
        assert!(!config.is_exempt("/auth/status"));
        assert!(!config.is_exempt("/inquiries"));
    }

    #[test]
    fn test_silent_refresh_is_shorter_than_token_lifetime() {
        let config = ClientConfig::default();
        assert_eq!(config.silent_refresh_interval(), Duration::from_secs(840));
        assert!(config.silent_refresh_interval() < Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        assert!(ClientConfig::new("http://localhost:5000").validate().is_ok());
        assert!(matches!(
            ClientConfig::new("localhost:5000/api").validate(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://shop.example").validate(),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.timeout().is_none());
        assert_eq!(
            ClientConfig::new("http://shop.local/").normalized_base_url(),
            "http://shop.local"
        );
    }
}
