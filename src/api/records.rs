use axum::Extension;
use chrono::Local;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::records::next_entry_date;
use crate::records::TemperatureRecord;
use crate::records::Weather;
use crate::storage::Storage;
use crate::storage::UpsertRecordValues;

use super::Error;
use super::Form;
use super::Success;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub temperature: f64,
    pub weather: Weather,
    pub wind: bool,
    pub hail: bool,
    pub mist: bool,
    pub snow_cm: Option<f64>,
    pub rain_mm: Option<f64>,
    pub max_temp: Option<f64>,
    pub weight_kg: Option<f64>,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

impl RecordResponse {
    fn from_record(record: TemperatureRecord) -> Self {
        Self {
            id: record.id,
            date: record.date,
            temperature: record.temperature,
            weather: record.weather,
            wind: record.wind,
            hail: record.hail,
            mist: record.mist,
            snow_cm: record.snow_cm,
            rain_mm: record.rain_mm,
            max_temp: record.max_temp,
            weight_kg: record.weight_kg,
            notes: record.notes,
            created_at: record.created_at,
        }
    }

    fn from_record_multiple(mut records: Vec<TemperatureRecord>) -> Vec<Self> {
        records
            .drain(..)
            .map(Self::from_record)
            .collect::<Vec<Self>>()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordListResponse {
    pub records: Vec<RecordResponse>,

    /// First date without a record, `null` when every day is covered
    pub next_date: Option<NaiveDate>,
}

pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
) -> Result<Success<RecordListResponse>, Error> {
    let records = storage
        .find_all_records()
        .await
        .map_err(Error::internal_server_error)?;

    let dates = records
        .iter()
        .map(|record| record.date)
        .collect::<Vec<_>>();
    let next_date = next_entry_date(&dates, Local::now().date_naive());

    Ok(Success::ok(RecordListResponse {
        records: RecordResponse::from_record_multiple(records),
        next_date,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRecordForm {
    date: NaiveDate,
    temperature: f64,
    weather: Weather,
    #[serde(default)]
    wind: bool,
    #[serde(default)]
    hail: bool,
    #[serde(default)]
    mist: bool,
    snow_cm: Option<f64>,
    rain_mm: Option<f64>,
    max_temp: Option<f64>,
    weight_kg: Option<f64>,
    #[serde(default)]
    notes: String,
}

pub async fn submit<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<SubmitRecordForm>,
) -> Result<Success<RecordResponse>, Error> {
    let values = UpsertRecordValues {
        date: form.date,
        temperature: form.temperature,
        weather: form.weather,
        wind: form.wind,
        hail: form.hail,
        mist: form.mist,
        snow_cm: form.snow_cm,
        rain_mm: form.rain_mm,
        max_temp: form.max_temp,
        weight_kg: form.weight_kg,
        notes: &form.notes,
    };

    let record = storage
        .upsert_record(&values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(RecordResponse::from_record(record)))
}

#[derive(Debug, Serialize)]
pub struct ChartDataResponse {
    pub labels: Vec<NaiveDate>,
    pub temps: Vec<f64>,
    pub weights: Vec<Option<f64>>,
}

pub async fn chart_data<S: Storage>(
    Extension(storage): Extension<S>,
) -> Result<Success<ChartDataResponse>, Error> {
    let records = storage
        .find_all_records()
        .await
        .map_err(Error::internal_server_error)?;

    let mut data = ChartDataResponse {
        labels: Vec::with_capacity(records.len()),
        temps: Vec::with_capacity(records.len()),
        weights: Vec::with_capacity(records.len()),
    };

    for record in records {
        data.labels.push(record.date);
        data.temps.push(record.temperature);
        data.weights.push(record.weight_kg);
    }

    Ok(Success::ok(data))
}
