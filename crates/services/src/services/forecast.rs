//! Typed view of the WeatherAPI forecast payload.
//!
//! Only the fields the evaluator and the agenda endpoints consume are
//! modeled; everything else in the provider response is ignored. All hour
//! fields are optional because the provider omits or nulls them under
//! partial outages, and the evaluator degrades per field.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Format of the provider's location-local `time` field on each hour.
const HOUR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ForecastResponse {
    pub location: Option<ForecastLocation>,
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ForecastLocation {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tz_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ForecastDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub hour: Vec<ForecastHour>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ForecastHour {
    pub time_epoch: Option<i64>,
    /// Location-local timestamp, e.g. "2025-06-15 10:00".
    pub time: Option<String>,
    pub temp_c: Option<f64>,
    pub wind_kph: Option<f64>,
    pub chance_of_rain: Option<i32>,
    pub chance_of_snow: Option<i32>,
    pub uv: Option<f64>,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Condition {
    pub code: Option<i32>,
    pub text: Option<String>,
}

impl ForecastHour {
    /// Parses the provider's location-local `time` string. Matching by this
    /// field rather than `time_epoch` keeps agenda times in the location's
    /// wall clock, which is what users schedule against.
    pub fn local_time(&self) -> Option<NaiveDateTime> {
        let raw = self.time.as_deref()?;
        NaiveDateTime::parse_from_str(raw, HOUR_TIME_FORMAT).ok()
    }
}

impl ForecastResponse {
    /// Finds the hourly sample for the given local date and hour of day, if
    /// the forecast window covers it.
    pub fn hour_for(&self, date: NaiveDate, hour_of_day: u32) -> Option<&ForecastHour> {
        let day = self
            .forecast
            .forecastday
            .iter()
            .find(|d| d.date == date)?;
        day.hour.iter().find(|h| {
            h.local_time()
                .is_some_and(|t| t.date() == date && t.time().hour() == hour_of_day)
        })
    }
}
