//! Push subscriptions and snoozes
//!
//! A subscription is one browser endpoint with its Web Push keys. A snooze
//! suppresses notifications to one endpoint until a fixed daily cutoff.

use chrono::Duration;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Hour of day (local time) a snooze runs until
pub const SNOOZE_CUTOFF_HOUR: u32 = 19;

/// A registered browser endpoint
#[derive(Clone, Debug)]
pub struct PushSubscription {
    pub id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: NaiveDateTime,
}

/// Suppression window for one endpoint
#[derive(Clone, Debug)]
pub struct Snooze {
    pub endpoint: String,
    pub snooze_until: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Compute the end of a snooze requested at `now`
///
/// Today at 19:00, or tomorrow at 19:00 when that has already passed.
pub fn snooze_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    let cutoff = now
        .date()
        .and_hms_opt(SNOOZE_CUTOFF_HOUR, 0, 0)
        .expect("Valid time of day");

    if cutoff <= now {
        cutoff + Duration::days(1)
    } else {
        cutoff
    }
}
