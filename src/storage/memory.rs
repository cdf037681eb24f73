//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::records::TemperatureRecord;
use crate::subscriptions::PushSubscription;
use crate::subscriptions::Snooze;

use super::Result;
use super::Storage;
use super::UpsertRecordValues;
use super::UpsertSubscriptionValues;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// All records in storage, keyed by date
    records: Arc<Mutex<HashMap<NaiveDate, TemperatureRecord>>>,

    /// All subscriptions in storage, keyed by endpoint
    subscriptions: Arc<Mutex<HashMap<String, PushSubscription>>>,

    /// All snoozes in storage, keyed by endpoint
    snoozes: Arc<Mutex<HashMap<String, Snooze>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            snoozes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Storage for Memory {
    async fn find_all_records(&self) -> Result<Vec<TemperatureRecord>> {
        let mut records = self
            .records
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();

        records.sort_by_key(|record| record.date);

        Ok(records)
    }

    async fn find_record_by_date(&self, date: NaiveDate) -> Result<Option<TemperatureRecord>> {
        Ok(self.records.lock().await.get(&date).cloned())
    }

    async fn upsert_record(&self, values: &UpsertRecordValues) -> Result<TemperatureRecord> {
        let mut records = self.records.lock().await;

        // keep the identity and creation time of a replaced record
        let (id, created_at) = records
            .get(&values.date)
            .map_or((Uuid::new_v4(), Utc::now().naive_utc()), |existing| {
                (existing.id, existing.created_at)
            });

        let record = TemperatureRecord {
            id,
            date: values.date,
            temperature: values.temperature,
            weather: values.weather,
            wind: values.wind,
            hail: values.hail,
            mist: values.mist,
            snow_cm: values.snow_cm,
            rain_mm: values.rain_mm,
            max_temp: values.max_temp,
            weight_kg: values.weight_kg,
            notes: values.notes.to_string(),
            created_at,
        };

        records.insert(record.date, record.clone());

        Ok(record)
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<PushSubscription>> {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();

        subscriptions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.endpoint.cmp(&b.endpoint)));

        Ok(subscriptions)
    }

    async fn upsert_subscription(
        &self,
        values: &UpsertSubscriptionValues,
    ) -> Result<PushSubscription> {
        let mut subscriptions = self.subscriptions.lock().await;

        let (id, created_at) = subscriptions
            .get(values.endpoint)
            .map_or((Uuid::new_v4(), Utc::now().naive_utc()), |existing| {
                (existing.id, existing.created_at)
            });

        let subscription = PushSubscription {
            id,
            endpoint: values.endpoint.to_string(),
            p256dh: values.p256dh.to_string(),
            auth: values.auth.to_string(),
            created_at,
        };

        subscriptions.insert(subscription.endpoint.clone(), subscription.clone());

        Ok(subscription)
    }

    async fn delete_subscription(&self, endpoint: &str) -> Result<()> {
        self.subscriptions.lock().await.remove(endpoint);

        Ok(())
    }

    async fn find_snooze(&self, endpoint: &str) -> Result<Option<Snooze>> {
        Ok(self.snoozes.lock().await.get(endpoint).cloned())
    }

    async fn upsert_snooze(&self, endpoint: &str, snooze_until: NaiveDateTime) -> Result<Snooze> {
        let mut snoozes = self.snoozes.lock().await;

        let created_at = snoozes
            .get(endpoint)
            .map_or(Utc::now().naive_utc(), |existing| existing.created_at);

        let snooze = Snooze {
            endpoint: endpoint.to_string(),
            snooze_until,
            created_at,
        };

        snoozes.insert(snooze.endpoint.clone(), snooze.clone());

        Ok(snooze)
    }

    async fn delete_snooze(&self, endpoint: &str) -> Result<()> {
        self.snoozes.lock().await.remove(endpoint);

        Ok(())
    }
}
