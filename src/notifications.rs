//! Push notification dispatch
//!
//! The Web Push protocol itself (VAPID signing, payload encryption) is
//! delegated to the `web-push` crate behind the [`Pusher`] trait, so the
//! dispatch policy can be exercised with a mock.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use web_push::ContentEncoding;
use web_push::HyperWebPushClient;
use web_push::SubscriptionInfo;
use web_push::VapidSignatureBuilder;
use web_push::WebPushClient;
use web_push::WebPushError;
use web_push::WebPushMessageBuilder;
use web_push::URL_SAFE_NO_PAD;

use crate::config::Config;
use crate::storage::Result as StorageResult;
use crate::storage::Storage;
use crate::subscriptions::PushSubscription;

/// What the browser shows the user
#[derive(Clone, Debug, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,

    /// Label for the snooze action, only present on reminders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snooze: Option<String>,
}

impl NotificationPayload {
    /// The daily reminder for a missing entry
    pub fn reminder() -> Self {
        Self {
            title: "Temperature reminder".to_string(),
            body: "You haven't submitted today's temperature yet.".to_string(),
            snooze: Some("Snooze until 19:00".to_string()),
        }
    }

    /// A test notification with optional overrides
    pub fn test(title: Option<String>, body: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| "Test notification".to_string()),
            body: body.unwrap_or_else(|| "This is a test notification.".to_string()),
            snooze: None,
        }
    }
}

/// Push delivery errors
#[derive(Debug, Error)]
pub enum PushError {
    /// The push service reported the endpoint as permanently gone
    #[error("Subscription endpoint is gone")]
    EndpointGone,

    /// Any other delivery failure, the subscription is kept
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivery of a payload to a single subscription
#[async_trait]
pub trait Pusher: Clone + Send + Sync + 'static {
    /// Send the payload to the subscription endpoint
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError>;
}

/// Production pusher backed by the Web Push protocol
#[derive(Clone)]
pub struct WebPushPusher {
    /// HTTP client for the push services
    client: HyperWebPushClient,

    /// VAPID private key, base64 (url-safe, no padding)
    vapid_private_key: String,

    /// VAPID claim subject
    vapid_subject: String,
}

impl WebPushPusher {
    /// Create a pusher from the configured VAPID identity
    pub fn new(config: &Config) -> Self {
        Self {
            client: HyperWebPushClient::new(),
            vapid_private_key: config.vapid_private_key.clone(),
            vapid_subject: config.vapid_subject.clone(),
        }
    }
}

#[async_trait]
impl Pusher for WebPushPusher {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        let subscription_info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );

        let mut signature_builder = VapidSignatureBuilder::from_base64(
            &self.vapid_private_key,
            URL_SAFE_NO_PAD,
            &subscription_info,
        )
        .map_err(delivery_error)?;
        signature_builder.add_claim("sub", self.vapid_subject.clone());

        let signature = signature_builder.build().map_err(delivery_error)?;

        let body = serde_json::to_vec(payload).map_err(delivery_error)?;

        let mut message_builder = WebPushMessageBuilder::new(&subscription_info);
        message_builder.set_payload(ContentEncoding::Aes128Gcm, &body);
        message_builder.set_vapid_signature(signature);

        let message = message_builder.build().map_err(delivery_error)?;

        match self.client.send(message).await {
            Ok(()) => Ok(()),
            Err(WebPushError::EndpointNotFound | WebPushError::EndpointNotValid) => {
                Err(PushError::EndpointGone)
            }
            Err(err) => Err(PushError::Delivery(err.to_string())),
        }
    }
}

/// Convert any error into a non-permanent delivery error
fn delivery_error<E>(err: E) -> PushError
where
    E: std::fmt::Display,
{
    PushError::Delivery(err.to_string())
}

/// Per-subscription result of a dispatch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub endpoint: String,
    pub sent: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn sent(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            sent: true,
            skipped: None,
            error: None,
        }
    }

    fn snoozed(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            sent: false,
            skipped: Some("snoozed".to_string()),
            error: None,
        }
    }

    fn failed(endpoint: &str, err: &PushError) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            sent: false,
            skipped: None,
            error: Some(err.to_string()),
        }
    }
}

/// Send a payload to every stored subscription
///
/// Endpoints with an active snooze are skipped, expired snoozes are purged
/// along the way. A permanently gone endpoint has its subscription deleted.
/// Delivery failures are contained per subscription, the outcome list always
/// covers every subscription.
pub async fn dispatch<S: Storage, P: Pusher>(
    storage: &S,
    pusher: &P,
    payload: &NotificationPayload,
    now: NaiveDateTime,
) -> StorageResult<Vec<DispatchOutcome>> {
    let subscriptions = storage.find_all_subscriptions().await?;

    let mut outcomes = Vec::with_capacity(subscriptions.len());

    for subscription in subscriptions {
        if let Some(snooze) = storage.find_snooze(&subscription.endpoint).await? {
            if snooze.snooze_until >= now {
                tracing::debug!("Skipping snoozed endpoint: {}", subscription.endpoint);

                outcomes.push(DispatchOutcome::snoozed(&subscription.endpoint));
                continue;
            }

            storage.delete_snooze(&subscription.endpoint).await?;
        }

        match pusher.send(&subscription, payload).await {
            Ok(()) => outcomes.push(DispatchOutcome::sent(&subscription.endpoint)),
            Err(err) => {
                if matches!(err, PushError::EndpointGone) {
                    tracing::info!("Removing gone subscription: {}", subscription.endpoint);

                    storage.delete_subscription(&subscription.endpoint).await?;
                } else {
                    tracing::warn!(
                        "Delivery to {} failed: {err}",
                        subscription.endpoint
                    );
                }

                outcomes.push(DispatchOutcome::failed(&subscription.endpoint, &err));
            }
        }
    }

    Ok(outcomes)
}
