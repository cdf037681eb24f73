//! Postgres storage

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::records::TemperatureRecord;
use crate::records::Weather;
use crate::subscriptions::PushSubscription;
use crate::subscriptions::Snooze;

use super::Error;
use super::Result;
use super::Storage;
use super::UpsertRecordValues;
use super::UpsertSubscriptionValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// Postgres version of a temperature record
///
/// Weather lives in the database as text, the conversion to the enum happens
/// on the way out.
#[derive(sqlx::FromRow)]
struct PostgresRecord {
    id: Uuid,
    date: NaiveDate,
    temperature: f64,
    weather: String,
    wind: bool,
    hail: bool,
    mist: bool,
    snow_cm: Option<f64>,
    rain_mm: Option<f64>,
    max_temp: Option<f64>,
    weight_kg: Option<f64>,
    notes: String,
    created_at: NaiveDateTime,
}

impl PostgresRecord {
    /// Create a record from the postgres version
    fn into_record(self) -> Result<TemperatureRecord> {
        let weather = self.weather.parse::<Weather>().map_err(Error::Data)?;

        Ok(TemperatureRecord {
            id: self.id,
            date: self.date,
            temperature: self.temperature,
            weather,
            wind: self.wind,
            hail: self.hail,
            mist: self.mist,
            snow_cm: self.snow_cm,
            rain_mm: self.rain_mm,
            max_temp: self.max_temp,
            weight_kg: self.weight_kg,
            notes: self.notes,
            created_at: self.created_at,
        })
    }

    /// Create multiple records from the postgres version
    fn into_record_multiple(records: Vec<Self>) -> Result<Vec<TemperatureRecord>> {
        records.into_iter().map(Self::into_record).collect()
    }
}

/// Postgres version of a push subscription
#[derive(sqlx::FromRow)]
struct PostgresSubscription {
    id: Uuid,
    endpoint: String,
    p256dh: String,
    auth: String,
    created_at: NaiveDateTime,
}

impl PostgresSubscription {
    /// Create a subscription from the postgres version
    fn into_subscription(self) -> PushSubscription {
        PushSubscription {
            id: self.id,
            endpoint: self.endpoint,
            p256dh: self.p256dh,
            auth: self.auth,
            created_at: self.created_at,
        }
    }
}

/// Postgres version of a snooze
#[derive(sqlx::FromRow)]
struct PostgresSnooze {
    endpoint: String,
    snooze_until: NaiveDateTime,
    created_at: NaiveDateTime,
}

impl PostgresSnooze {
    /// Create a snooze from the postgres version
    fn into_snooze(self) -> Snooze {
        Snooze {
            endpoint: self.endpoint,
            snooze_until: self.snooze_until,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl Storage for Postgres {
    async fn find_all_records(&self) -> Result<Vec<TemperatureRecord>> {
        let records = sqlx::query_as::<_, PostgresRecord>(
            r"
            SELECT *
            FROM temperature_records
            ORDER BY date
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        PostgresRecord::into_record_multiple(records)
    }

    async fn find_record_by_date(&self, date: NaiveDate) -> Result<Option<TemperatureRecord>> {
        let record = sqlx::query_as::<_, PostgresRecord>(
            r"
            SELECT *
            FROM temperature_records
            WHERE date = $1
            LIMIT 1
            ",
        )
        .bind(date)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        record.map(PostgresRecord::into_record).transpose()
    }

    async fn upsert_record(&self, values: &UpsertRecordValues) -> Result<TemperatureRecord> {
        let record = sqlx::query_as::<_, PostgresRecord>(
            r"
            INSERT INTO temperature_records
                (id, date, temperature, weather, wind, hail, mist, snow_cm, rain_mm, max_temp, weight_kg, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (date) DO UPDATE SET
                temperature = EXCLUDED.temperature,
                weather = EXCLUDED.weather,
                wind = EXCLUDED.wind,
                hail = EXCLUDED.hail,
                mist = EXCLUDED.mist,
                snow_cm = EXCLUDED.snow_cm,
                rain_mm = EXCLUDED.rain_mm,
                max_temp = EXCLUDED.max_temp,
                weight_kg = EXCLUDED.weight_kg,
                notes = EXCLUDED.notes
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.date)
        .bind(values.temperature)
        .bind(values.weather.as_str())
        .bind(values.wind)
        .bind(values.hail)
        .bind(values.mist)
        .bind(values.snow_cm)
        .bind(values.rain_mm)
        .bind(values.max_temp)
        .bind(values.weight_kg)
        .bind(values.notes)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        record.into_record()
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<PushSubscription>> {
        let subscriptions = sqlx::query_as::<_, PostgresSubscription>(
            r"
            SELECT *
            FROM push_subscriptions
            ORDER BY created_at
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(subscriptions
            .into_iter()
            .map(PostgresSubscription::into_subscription)
            .collect())
    }

    async fn upsert_subscription(
        &self,
        values: &UpsertSubscriptionValues,
    ) -> Result<PushSubscription> {
        let subscription = sqlx::query_as::<_, PostgresSubscription>(
            r"
            INSERT INTO push_subscriptions (id, endpoint, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint) DO UPDATE SET
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.endpoint)
        .bind(values.p256dh)
        .bind(values.auth)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(subscription.into_subscription())
    }

    async fn delete_subscription(&self, endpoint: &str) -> Result<()> {
        sqlx::query(
            r"
            DELETE FROM push_subscriptions
            WHERE endpoint = $1
            ",
        )
        .bind(endpoint)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn find_snooze(&self, endpoint: &str) -> Result<Option<Snooze>> {
        let snooze = sqlx::query_as::<_, PostgresSnooze>(
            r"
            SELECT *
            FROM snoozes
            WHERE endpoint = $1
            LIMIT 1
            ",
        )
        .bind(endpoint)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(snooze.map(PostgresSnooze::into_snooze))
    }

    async fn upsert_snooze(&self, endpoint: &str, snooze_until: NaiveDateTime) -> Result<Snooze> {
        let snooze = sqlx::query_as::<_, PostgresSnooze>(
            r"
            INSERT INTO snoozes (endpoint, snooze_until)
            VALUES ($1, $2)
            ON CONFLICT (endpoint) DO UPDATE SET
                snooze_until = EXCLUDED.snooze_until
            RETURNING *
            ",
        )
        .bind(endpoint)
        .bind(snooze_until)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(snooze.into_snooze())
    }

    async fn delete_snooze(&self, endpoint: &str) -> Result<()> {
        sqlx::query(
            r"
            DELETE FROM snoozes
            WHERE endpoint = $1
            ",
        )
        .bind(endpoint)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
