use axum::extract::Query;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Extension;
use chrono::Local;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::config::Config;
use crate::notifications::dispatch;
use crate::notifications::DispatchOutcome;
use crate::notifications::NotificationPayload;
use crate::notifications::Pusher;
use crate::storage::Storage;
use crate::storage::UpsertSubscriptionValues;
use crate::subscriptions::snooze_cutoff;

use super::Error;
use super::Form;
use super::Success;

#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    endpoint: String,
    #[serde(default)]
    keys: SubscriptionKeys,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionKeys {
    #[serde(default)]
    p256dh: String,
    #[serde(default)]
    auth: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

pub async fn subscribe<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<SubscribeForm>,
) -> Result<Success<StatusResponse>, Error> {
    if form.endpoint.is_empty() {
        return Err(Error::bad_request("Endpoint required"));
    }

    let values = UpsertSubscriptionValues {
        endpoint: &form.endpoint,
        p256dh: &form.keys.p256dh,
        auth: &form.keys.auth,
    };

    storage
        .upsert_subscription(&values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(StatusResponse { status: "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct SnoozeForm {
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeResponse {
    status: &'static str,
    snooze_until: NaiveDateTime,
}

pub async fn snooze<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<SnoozeForm>,
) -> Result<Success<SnoozeResponse>, Error> {
    if form.endpoint.is_empty() {
        return Err(Error::bad_request("Endpoint required"));
    }

    let snooze_until = snooze_cutoff(Local::now().naive_local());

    let snooze = storage
        .upsert_snooze(&form.endpoint, snooze_until)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(SnoozeResponse {
        status: "ok",
        snooze_until: snooze.snooze_until,
    }))
}

/// The VAPID public key as plain text for clients to fetch
pub async fn vapid_public_key(Extension(config): Extension<Config>) -> String {
    config.vapid_public_key.clone()
}

#[derive(Debug, Deserialize)]
pub struct NotifyTestForm {
    title: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    sent: Vec<DispatchOutcome>,
}

pub async fn notify_test<S: Storage, P: Pusher>(
    Extension(storage): Extension<S>,
    Extension(pusher): Extension<P>,
    Extension(config): Extension<Config>,
    headers: HeaderMap,
    Form(form): Form<NotifyTestForm>,
) -> Result<Success<DispatchResponse>, Error> {
    authorize_admin(&headers, &config)?;

    let payload = NotificationPayload::test(form.title, form.body);

    let sent = dispatch(&storage, &pusher, &payload, Local::now().naive_local())
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DispatchResponse { sent }))
}

#[derive(Debug, Deserialize)]
pub struct PingParams {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    sent: Option<Vec<DispatchOutcome>>,
}

/// Called periodically by an external scheduler
///
/// If today's temperature is missing, send the reminder push.
pub async fn ping<S: Storage, P: Pusher>(
    Extension(storage): Extension<S>,
    Extension(pusher): Extension<P>,
    Extension(config): Extension<Config>,
    Query(params): Query<PingParams>,
) -> Result<Success<PingResponse>, Error> {
    if config.ping_token.is_empty() || params.token.as_deref() != Some(config.ping_token.as_str())
    {
        return Err(Error::bad_request("Invalid token"));
    }

    let today = Local::now().date_naive();

    let submitted = storage
        .find_record_by_date(today)
        .await
        .map_err(Error::internal_server_error)?
        .is_some();

    if submitted {
        return Ok(Success::ok(PingResponse {
            ok: true,
            message: Some("today submitted".to_string()),
            sent: None,
        }));
    }

    let sent = dispatch(
        &storage,
        &pusher,
        &NotificationPayload::reminder(),
        Local::now().naive_local(),
    )
    .await
    .map_err(Error::internal_server_error)?;

    Ok(Success::ok(PingResponse {
        ok: true,
        message: None,
        sent: Some(sent),
    }))
}

/// Check the bearer token against the configured admin token
///
/// An unconfigured (empty) admin token locks the endpoint.
fn authorize_admin(headers: &HeaderMap, config: &Config) -> Result<(), Error> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if !config.admin_token.is_empty() && token == config.admin_token => Ok(()),
        _ => Err(Error::forbidden("Invalid admin token")),
    }
}
