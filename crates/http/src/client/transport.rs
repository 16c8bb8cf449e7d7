//! Transport seam between the client and the network
//!
//! [`HttpTransport`] is backed by reqwest with a cookie store, so the
//! HTTP-only session cookies set by the backend are attached to every later
//! request without the client ever reading them.

use crate::client::config::ClientConfig;
use crate::client::error::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Method, StatusCode,
    header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A request against the backend API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// API path relative to the base URL, e.g. `/inquiries?page=2`
    pub path: String,
    pub body: Option<Value>,
    /// Set once the request has been replayed after a refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The same request marked as replayed
    #[must_use]
    pub fn into_replay(self) -> Self {
        Self {
            retried: true,
            ..self
        }
    }
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Build a response with a JSON body and no headers
    pub fn json_body(status: StatusCode, body: &Value) -> Self {
        Self::new(status, HeaderMap::new(), body.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// `Retry-After` header expressed in seconds
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }
}

/// Sends requests to the backend
///
/// Implementations own credential handling: the client never attaches
/// tokens itself.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and buffer the response
    ///
    /// Non-2xx statuses are returned as responses; only failures to reach
    /// the server are errors.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// reqwest-backed transport with a cookie store
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the configured backend
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the configuration is invalid
    /// or the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone());

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url().to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), url);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ApiResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_replay_keeps_request_intact() {
        let request = ApiRequest::new(Method::POST, "/quotations")
            .with_body(json!({"inquiry_id": 12, "amount": "49.90"}));
        let replay = request.clone().into_replay();

        assert!(!request.retried);
        assert!(replay.retried);
        assert_eq!(replay.method, request.method);
        assert_eq!(replay.path, request.path);
        assert_eq!(replay.body, request.body);
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        let response = ApiResponse::new(StatusCode::TOO_MANY_REQUESTS, headers, "");
        assert_eq!(response.retry_after(), Some(Duration::from_secs(30)));

        let response = ApiResponse::json_body(StatusCode::TOO_MANY_REQUESTS, &json!({}));
        assert_eq!(response.retry_after(), None);
    }

    #[test]
    fn test_transport_rejects_invalid_config() {
        let config = ClientConfig::new("not a url");
        assert!(matches!(
            HttpTransport::new(&config),
            Err(ClientError::Configuration(_))
        ));
    }
}
