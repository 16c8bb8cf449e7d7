//! Integration tests for the RepairDesk HTTP client against a mock backend

use repairdesk_http::{AuthenticatedRequestClient, ClientConfig, ClientError, RouteTracker};
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests carrying the given `name=value` cookie
struct HasCookie(&'static str);

impl Match for HasCookie {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("cookie")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookies| cookies.split("; ").any(|cookie| cookie == self.0))
    }
}

fn client_for(server: &MockServer, route: &str) -> (AuthenticatedRequestClient, Arc<RouteTracker>) {
    let navigator = Arc::new(RouteTracker::new(route));
    let client = AuthenticatedRequestClient::builder()
        .config(ClientConfig::new(server.uri()))
        .navigator(navigator.clone())
        .build()
        .unwrap();
    (client, navigator)
}

async fn mount_login(server: &MockServer, cookie: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("{cookie}; Path=/; HttpOnly"))
                .set_body_json(json!({"username": "alice"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_builder_requires_valid_base_url() {
    let result = AuthenticatedRequestClient::new("not a url");
    assert!(matches!(result, Err(ClientError::Configuration(_))));

    let client = AuthenticatedRequestClient::new("http://localhost:5000/").unwrap();
    assert_eq!(client.config().normalized_base_url(), "http://localhost:5000");
}

#[tokio::test]
async fn test_login_cookie_is_sent_on_later_requests() {
    let server = MockServer::start().await;
    mount_login(&server, "access_token=abc").await;

    Mock::given(method("GET"))
        .and(path("/auth/status"))
        .and(HasCookie("access_token=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"username": "alice", "shop_name": "Fix-It Corner"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, "/login");
    let login = client.login("alice@shop.test", "secret").await.unwrap();
    assert_eq!(login.username, "alice");

    let profile = client.status().await.unwrap();
    assert_eq!(profile.shop_name.as_deref(), Some("Fix-It Corner"));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_concurrent_expiry_refreshes_once_and_replays() {
    let server = MockServer::start().await;
    mount_login(&server, "refresh_token=r1").await;

    // Delayed so every 401 arrives while the refresh is still in flight
    Mock::given(method("POST"))
        .and(path("/refresh-token"))
        .and(HasCookie("refresh_token=r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "access_token=fresh; Path=/; HttpOnly")
                .set_body_json(json!({"accessToken": "ignored"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    for endpoint in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(HasCookie("access_token=fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": endpoint})))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Access token expired"})),
        )
        .with_priority(10)
        .expect(3)
        .mount(&server)
        .await;

    let (client, navigator) = client_for(&server, "/dashboard");
    client.login("alice@shop.test", "secret").await.unwrap();

    let (a, b, c) = tokio::join!(
        client.get_json::<Value>("/a"),
        client.get_json::<Value>("/b"),
        client.get_json::<Value>("/c"),
    );

    assert_eq!(a.unwrap()["path"], "/a");
    assert_eq!(b.unwrap()["path"], "/b");
    assert_eq!(c.unwrap()["path"], "/c");
    assert!(navigator.navigations().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_refresh_failure_rejects_and_redirects_to_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Refresh token expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, navigator) = client_for(&server, "/orders");
    let err = client
        .request(Method::GET, "/orders", None)
        .await
        .unwrap_err();

    match err {
        ClientError::SessionExpired(refresh) => {
            assert_eq!(refresh.status, Some(401));
            assert_eq!(refresh.message, "Refresh token expired");
        }
        other => panic!("expected SessionExpired, got {other:?}"),
    }
    assert_eq!(navigator.navigations(), vec!["/login".to_string()]);
    server.verify().await;
}

#[tokio::test]
async fn test_login_rate_limit_uses_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "45")
                .set_body_json(json!({"error": "Too many login attempts. Try again later."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, "/login");
    let err = client.login("alice@shop.test", "guess").await.unwrap_err();

    match err {
        ClientError::RateLimited {
            message,
            retry_after,
        } => {
            assert!(message.contains("Too many login attempts"));
            assert_eq!(retry_after, Some(Duration::from_secs(45)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // Second attempt is refused locally
    let err = client.login("alice@shop.test", "guess").await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { .. }));
    server.verify().await;
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let client = AuthenticatedRequestClient::new("http://127.0.0.1:9").unwrap();

    let err = client
        .request(Method::GET, "/inquiries", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert!(!client.is_refreshing());
}
