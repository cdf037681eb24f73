//! All things related to the storage of records, subscriptions, and snoozes

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::records::TemperatureRecord;
use crate::records::Weather;
use crate::subscriptions::PushSubscription;
use crate::subscriptions::Snooze;

#[cfg(not(feature = "postgres"))]
use memory::Memory;
#[cfg(feature = "postgres")]
use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> Postgres {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// Stored data that can not be interpreted
    #[error("Data error: {0}")]
    Data(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create or replace a temperature record
///
/// The record is keyed by its date, submitting a known date replaces the
/// observations of that day.
pub struct UpsertRecordValues<'a> {
    /// The calendar date of the observation
    pub date: NaiveDate,

    /// Temperature in °C
    pub temperature: f64,

    /// Categorical weather condition
    pub weather: Weather,

    /// Wind flag
    pub wind: bool,

    /// Hail flag
    pub hail: bool,

    /// Mist flag
    pub mist: bool,

    /// Snow depth in cm
    pub snow_cm: Option<f64>,

    /// Rainfall in mm
    pub rain_mm: Option<f64>,

    /// Maximum temperature in °C
    pub max_temp: Option<f64>,

    /// Body weight in kg
    pub weight_kg: Option<f64>,

    /// Free-text notes
    pub notes: &'a str,
}

/// Values to register or refresh a push subscription
pub struct UpsertSubscriptionValues<'a> {
    /// The browser endpoint, unique per subscription
    pub endpoint: &'a str,

    /// The p256dh key of the subscription
    pub p256dh: &'a str,

    /// The auth key of the subscription
    pub auth: &'a str,
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find all temperature records, ordered by date
    async fn find_all_records(&self) -> Result<Vec<TemperatureRecord>>;

    /// Find the temperature record of a single date
    async fn find_record_by_date(&self, date: NaiveDate) -> Result<Option<TemperatureRecord>>;

    /// Create a temperature record, or replace the one sharing its date
    async fn upsert_record(&self, values: &UpsertRecordValues) -> Result<TemperatureRecord>;

    /// Find all push subscriptions
    async fn find_all_subscriptions(&self) -> Result<Vec<PushSubscription>>;

    /// Create a push subscription, or refresh the keys of a known endpoint
    async fn upsert_subscription(
        &self,
        values: &UpsertSubscriptionValues,
    ) -> Result<PushSubscription>;

    /// Delete the subscription of an endpoint
    async fn delete_subscription(&self, endpoint: &str) -> Result<()>;

    /// Find the snooze of an endpoint
    async fn find_snooze(&self, endpoint: &str) -> Result<Option<Snooze>>;

    /// Create or move the snooze of an endpoint
    async fn upsert_snooze(&self, endpoint: &str, snooze_until: NaiveDateTime) -> Result<Snooze>;

    /// Delete the snooze of an endpoint
    async fn delete_snooze(&self, endpoint: &str) -> Result<()>;
}
