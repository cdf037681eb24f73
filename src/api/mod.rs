//! All API endpoint setup

use axum::extract::Request;
use axum::http::header::HOST;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Extension;
use axum::Router;

pub use request::Form;
pub use response::Error;
pub use response::Success;

use crate::config::Config;
use crate::notifications::Pusher;
use crate::storage::Storage;

mod push;
mod records;
mod request;
mod response;

/// Get the Axum router for all API routes
pub fn router<S: Storage, P: Pusher>() -> Router {
    Router::new()
        .route("/records", get(records::list::<S>))
        .route("/records", post(records::submit::<S>))
        .route("/chart-data", get(records::chart_data::<S>))
        .route("/subscriptions", post(push::subscribe::<S>))
        .route("/snooze", post(push::snooze::<S>))
        .route("/vapid-public-key", get(push::vapid_public_key))
        .route("/notifications/test", post(push::notify_test::<S, P>))
        .route("/ping", get(push::ping::<S, P>))
}

/// Reject requests from hosts outside the allow-list
///
/// An empty `ALLOWED_HOSTS` allows everything. A port in the `Host` header
/// is ignored for the comparison.
pub async fn check_host(
    Extension(config): Extension<Config>,
    request: Request,
    next: Next,
) -> Response {
    if config.allowed_hosts.is_empty() {
        return next.run(request).await;
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|header| header.to_str().ok())
        .map(|host| host.split(':').next().unwrap_or(host).to_string());

    match host {
        Some(host) if config.allowed_hosts.contains(&host) => next.run(request).await,
        _ => Error::bad_request("Host not allowed").into_response(),
    }
}
