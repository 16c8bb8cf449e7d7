//! Authenticated request client
//!
//! [`AuthenticatedRequestClient`] sends every request through a
//! [`Transport`] whose cookie store carries the credentials. When a request
//! comes back 401 the client refreshes the session once, parks any other
//! request that hits 401 in the meantime, and replays each of them exactly
//! once when the refresh settles.

pub mod auth;
pub mod config;
pub mod error;
pub mod refresh;
pub mod session;
mod silent;
pub mod transport;


use config::{ClientConfig, REFRESH_PATH};
use error::{ClientError, RefreshError};
use refresh::RefreshCoordinator;
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use session::{Navigator, RouteTracker, SessionState};
use silent::SilentRefresh;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

/// Client for the repair-shop backend API
///
/// Cloning is cheap and clones share the session, the refresh state and the
/// silent refresh timer. Independent clients never share any of them.
#[derive(Clone)]
pub struct AuthenticatedRequestClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
    coordinator: Arc<RefreshCoordinator>,
    session: SessionState,
    silent: SilentRefresh,
    /// Logins are refused locally until this instant after a 429
    login_locked_until: Mutex<Option<Instant>>,
}

impl AuthenticatedRequestClient {
    /// Create a client for `base_url` with default configuration
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the URL is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().config(ClientConfig::new(base_url)).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Local session state
    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    /// Whether a token refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Whether the silent refresh timer is running
    pub fn silent_refresh_scheduled(&self) -> bool {
        self.inner.silent.is_scheduled()
    }

    /// Send a request to an API path
    ///
    /// A 401 on a non-exempt path refreshes the session and replays the
    /// request once.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidPath`] if `path` is not an API path
    /// - [`ClientError::Network`] if the server cannot be reached
    /// - [`ClientError::SessionExpired`] if the session could not be refreshed
    /// - [`ClientError::Http`] for any other non-2xx response
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ClientError> {
        validate_path(path)?;
        let mut request = ApiRequest::new(method, path);
        request.body = body;
        self.inner.dispatch(request).await
    }

    /// GET `path` and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None).await?.json()
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(body)).await?.json()
    }

    /// PUT a JSON body to `path` and decode the JSON response
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(body)).await?.json()
    }

    /// DELETE `path`
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request(Method::DELETE, path, None).await
    }
}

impl ClientInner {
    async fn dispatch(self: &Arc<Self>, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        debug!(method = %request.method, path = %request.path, retried = request.retried, "sending request");
        let response = self.transport.send(&request).await?;

        if response.is_success() {
            return Ok(response);
        }
        if !self.is_recoverable(&request, &response) {
            return Err(ClientError::from_response(&response));
        }

        debug!(path = %request.path, "access token rejected, refreshing session");
        self.refresh_session().await?;

        let replay = request.into_replay();
        debug!(method = %replay.method, path = %replay.path, "replaying request after refresh");
        let response = self.transport.send(&replay).await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_response(&response))
        }
    }

    fn is_recoverable(&self, request: &ApiRequest, response: &ApiResponse) -> bool {
        response.status() == reqwest::StatusCode::UNAUTHORIZED
            && !request.retried
            && !self.config.is_exempt(&request.path)
    }

    /// Refresh the session, joining a refresh already in flight
    ///
    /// A failed refresh ends the session from the refresh task itself, so the
    /// redirect to the login route happens once per failure even when every
    /// caller has gone away.
    pub(crate) async fn refresh_session(self: &Arc<Self>) -> Result<(), ClientError> {
        let inner = Arc::clone(self);
        let outcome = self
            .coordinator
            .run(|| async move {
                let result = inner.call_refresh_endpoint().await;
                if result.is_err() {
                    inner.end_session();
                }
                result
            })
            .await;

        outcome.result.map_err(ClientError::SessionExpired)
    }

    async fn call_refresh_endpoint(&self) -> Result<(), RefreshError> {
        info!("refreshing access token");
        let request = ApiRequest::new(Method::POST, REFRESH_PATH);

        match self.transport.send(&request).await {
            Ok(response) if response.is_success() => {
                info!("access token refreshed");
                Ok(())
            }
            Ok(response) => {
                let error = RefreshError::from_client_error(&ClientError::from_response(&response));
                warn!(status = ?error.status, message = %error.message, "token refresh rejected");
                Err(error)
            }
            Err(err) => {
                warn!(error = %err, "token refresh could not reach the server");
                Err(RefreshError::from_client_error(&err))
            }
        }
    }

    /// Drop local user state and send the user to the login route
    fn end_session(&self) {
        self.silent.cancel();
        if let Some(profile) = self.session.clear() {
            info!(username = %profile.username, "session ended");
        }

        let login_route = &self.config.login_route;
        if self.navigator.current_route() != *login_route {
            self.navigator.navigate(login_route);
        }
    }

    fn schedule_silent_refresh(self: &Arc<Self>) {
        self.silent.schedule(
            Arc::downgrade(self),
            self.config.silent_refresh_interval(),
        );
    }
}

/// Only the part before any query or fragment has to look like an API path
fn validate_path(path: &str) -> Result<(), ClientError> {
    let route = path.split(['?', '#']).next().unwrap_or_default();
    if !route.starts_with('/') || route.starts_with("//") || route.contains("://") {
        return Err(ClientError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Builder for [`AuthenticatedRequestClient`]
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ClientBuilder {
    /// Set the configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom transport instead of the reqwest one
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the navigator used to reach the login route
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the configuration is invalid.
    pub fn build(self) -> Result<AuthenticatedRequestClient, ClientError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(RouteTracker::default()));

        Ok(AuthenticatedRequestClient {
            inner: Arc::new(ClientInner {
                config,
                transport,
                navigator,
                coordinator: Arc::new(RefreshCoordinator::new()),
                session: SessionState::new(),
                silent: SilentRefresh::default(),
                login_locked_until: Mutex::new(None),
            }),
        })
    }
}
