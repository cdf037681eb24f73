use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::HOST;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::json;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::Service;

use crate::config::Config;
use crate::create_router;
use crate::notifications::NotificationPayload;
use crate::notifications::PushError;
use crate::notifications::Pusher;
use crate::subscriptions::PushSubscription;

pub const PING_TOKEN: &str = "pingsecret";
pub const ADMIN_TOKEN: &str = "adminsecret";

/// Pusher that keeps everything in memory instead of talking to a push service
#[derive(Clone, Default)]
pub struct MockPusher {
    /// Successfully delivered payloads, per endpoint
    pub sent: Arc<Mutex<Vec<(String, NotificationPayload)>>>,

    /// Endpoints the "push service" reports as permanently gone
    pub gone_endpoints: Arc<Mutex<HashSet<String>>>,

    /// Endpoints that fail with a non-permanent delivery error
    pub failing_endpoints: Arc<Mutex<HashSet<String>>>,
}

impl MockPusher {
    pub async fn mark_gone(&self, endpoint: &str) {
        self.gone_endpoints.lock().await.insert(endpoint.to_string());
    }

    pub async fn mark_failing(&self, endpoint: &str) {
        self.failing_endpoints
            .lock()
            .await
            .insert(endpoint.to_string());
    }

    pub async fn sent_payloads(&self) -> Vec<(String, NotificationPayload)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Pusher for MockPusher {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        if self
            .gone_endpoints
            .lock()
            .await
            .contains(&subscription.endpoint)
        {
            return Err(PushError::EndpointGone);
        }

        if self
            .failing_endpoints
            .lock()
            .await
            .contains(&subscription.endpoint)
        {
            return Err(PushError::Delivery("connection refused".to_string()));
        }

        self.sent
            .lock()
            .await
            .push((subscription.endpoint.clone(), payload.clone()));

        Ok(())
    }
}

/// A configuration without touching the environment, so tests stay hermetic
pub fn test_config() -> Config {
    Config {
        address: "0.0.0.0:6000".parse().unwrap(),
        vapid_private_key: String::new(),
        vapid_public_key: "test-public-key".to_string(),
        vapid_subject: "mailto:admin@example.com".to_string(),
        ping_token: PING_TOKEN.to_string(),
        admin_token: ADMIN_TOKEN.to_string(),
        allowed_hosts: Vec::new(),
        debug: false,
    }
}

/// Setup the app with memory storage and a mock pusher
pub async fn setup_test_app() -> (Router, MockPusher) {
    setup_test_app_with_config(test_config()).await
}

/// Setup the app with a custom configuration
pub async fn setup_test_app_with_config(config: Config) -> (Router, MockPusher) {
    let storage = crate::storage::setup().await;
    let pusher = MockPusher::default();

    (create_router(storage, pusher.clone(), config), pusher)
}

async fn send(app: &mut Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.call(request).await.unwrap();

    let status_code = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, body)
}

fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(&body[..]).unwrap_or(Value::Null)
}

pub async fn get(app: &mut Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let (status_code, body) = send(app, request).await;

    (status_code, parse_body(&body))
}

pub async fn get_text(app: &mut Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let (status_code, body) = send(app, request).await;

    (status_code, String::from_utf8_lossy(&body[..]).to_string())
}

pub async fn get_with_host(app: &mut Router, uri: &str, host: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(HOST, host)
        .body(Body::empty())
        .unwrap();

    let (status_code, body) = send(app, request).await;

    (status_code, parse_body(&body))
}

pub async fn post_json(app: &mut Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap();

    let (status_code, body) = send(app, request).await;

    (status_code, parse_body(&body))
}

pub async fn post_json_with_token(
    app: &mut Router,
    uri: &str,
    payload: &Value,
    token: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap();

    let (status_code, body) = send(app, request).await;

    (status_code, parse_body(&body))
}

pub async fn post_raw(
    app: &mut Router,
    uri: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri);

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder.body(Body::from(body.as_bytes())).unwrap();

    let (status_code, body) = send(app, request).await;

    (status_code, parse_body(&body))
}

/// Register a subscription for the endpoint, asserting success
pub async fn subscribe(app: &mut Router, endpoint: &str) {
    let payload = json!({
        "endpoint": endpoint,
        "keys": {"p256dh": "p256dh-key", "auth": "auth-secret"},
    });

    let (status_code, _) = post_json(app, "/api/subscriptions", &payload).await;

    assert_eq!(StatusCode::CREATED, status_code);
}

/// Submit a minimal record for the date, asserting success
pub async fn submit_record(app: &mut Router, date: NaiveDate, temperature: f64) -> Value {
    let payload = json!({
        "date": date.to_string(),
        "temperature": temperature,
        "weather": "sunny",
    });

    let (status_code, body) = post_json(app, "/api/records", &payload).await;

    assert_eq!(StatusCode::CREATED, status_code);

    body
}

/// Trigger the ping endpoint with the test token
pub async fn ping(app: &mut Router) -> (StatusCode, Value) {
    get(app, &format!("/api/ping?token={PING_TOKEN}")).await
}

/// Find the dispatch outcome of an endpoint in a `sent` array
pub fn outcome_for<'v>(sent: &'v Value, endpoint: &str) -> &'v Value {
    sent.as_array()
        .unwrap()
        .iter()
        .find(|outcome| outcome["endpoint"] == endpoint)
        .unwrap()
}
