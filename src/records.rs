//! Temperature records
//!
//! One observation per calendar date, plus the policy to find the next date
//! that still needs an entry.

use std::str::FromStr;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Categorical weather condition of a day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Sunny,
    FewClouds,
    Cloudy,
    Rain,
    Snow,
}

impl Weather {
    /// The stable text form, also used by the storage backends
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::FewClouds => "few_clouds",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Snow => "snow",
        }
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sunny" => Ok(Self::Sunny),
            "few_clouds" => Ok(Self::FewClouds),
            "cloudy" => Ok(Self::Cloudy),
            "rain" => Ok(Self::Rain),
            "snow" => Ok(Self::Snow),
            other => Err(format!("Unknown weather condition: {other}")),
        }
    }
}

/// A single day of observations
#[derive(Clone, Debug)]
pub struct TemperatureRecord {
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

/// Find the next date that still needs an entry
///
/// Scans from the earliest recorded date through `today` and returns the
/// first date without a record. `None` means every day is covered. Without
/// any records the next date is `today` itself.
pub fn next_entry_date(dates: &[NaiveDate], today: NaiveDate) -> Option<NaiveDate> {
    let Some(first) = dates.iter().min().copied() else {
        return Some(today);
    };

    let mut day = first;

    while day <= today {
        if !dates.contains(&day) {
            return Some(day);
        }

        day = day.succ_opt()?;
    }

    None
}
